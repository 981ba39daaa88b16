//! Pre-interned identifiers the resolver compares against.

use veld_ast::{Atom, NameInterner};

/// Names with special meaning during resolution, interned once up front so
/// later comparisons are id equality.
#[derive(Debug, Clone, Copy)]
pub struct Keywords {
    pub arguments: Atom,
    pub eval: Atom,
    pub let_: Atom,
    pub constructor: Atom,
}

impl Keywords {
    pub fn new(names: &mut NameInterner) -> Self {
        Keywords {
            arguments: names.intern("arguments"),
            eval: names.intern("eval"),
            let_: names.intern("let"),
            constructor: names.intern("constructor"),
        }
    }
}

use rustc_hash::FxHashMap;

use crate::id::{Id, Symbol};

/// Interned callable names.
///
/// Names are only used for diagnostics and for sorting divergence samples, so
/// the table never removes entries.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    items: Vec<String>,
    item_map: FxHashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, item: impl Into<String>) -> Symbol {
        let item = item.into();
        if let Some(&symbol) = self.item_map.get(&item) {
            return symbol;
        }
        let symbol = Symbol(Id(self.items.len()));
        self.items.push(item.clone());
        self.item_map.insert(item, symbol);
        symbol
    }

    pub fn resolve(&self, symbol: Symbol) -> Option<&str> {
        self.items.get(symbol.0.raw()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

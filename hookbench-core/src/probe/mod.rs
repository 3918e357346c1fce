// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Probe abstractions.
//!
//! The harness only ever sees these seams:
//!
//! ```text
//!   ModuleResolver ──find_module──▶ ModuleInfo ──exports──▶ ExportTable
//!                                                              │ Address
//!   Interceptor ◀──attach(Address, ProbeListener)──────────────┘
//!        │
//!        └── per call: on_enter(&CallArgs) -> EntryToken
//!                      original(...)
//!                      on_leave(EntryToken, &mut ReturnValue)
//! ```
//!
//! Symbol names stop at the [`ExportTable`]; the probe path works on opaque
//! [`Address`] handles only.

pub mod dl;
pub mod inproc;

use std::collections::HashMap;
use std::ffi::{c_char, CStr, CString};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{AttachError, HardValidationError, ResolutionError};
use crate::types::{Address, SymbolName};
use crate::workload::ProbeCallRecord;

pub use dl::DlResolver;
pub use inproc::InProcessInterceptor;

/// One exported symbol of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedSymbol {
    pub name: SymbolName,
    pub address: Address,
}

/// Ordered export table of one module.
#[derive(Debug, Clone, Default)]
pub struct ExportTable {
    module: String,
    symbols: Vec<ExportedSymbol>,
}

impl ExportTable {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            symbols: Vec::new(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Append a symbol. A name already present keeps its first address.
    pub fn push(&mut self, name: SymbolName, address: Address) {
        if self.find(name.as_str()).is_none() {
            self.symbols.push(ExportedSymbol { name, address });
        }
    }

    pub fn with(mut self, name: SymbolName, address: Address) -> Self {
        self.push(name, address);
        self
    }

    /// Address of `name`, if exported.
    pub fn find(&self, name: &str) -> Option<Address> {
        self.symbols
            .iter()
            .find(|s| s.name.as_str() == name)
            .map(|s| s.address)
    }

    /// Name of the symbol at `address`.
    pub fn name_of(&self, address: Address) -> Option<&SymbolName> {
        self.symbols
            .iter()
            .find(|s| s.address == address)
            .map(|s| &s.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExportedSymbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// A module found in the current process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    /// Full path as reported by the loader, when there is one.
    pub path: Option<PathBuf>,
    /// Load base, when there is one.
    pub base: Option<Address>,
}

/// Module discovery and symbol resolution.
pub trait ModuleResolver: Send + Sync {
    /// Locate a loaded module by name.
    fn find_module(&self, module: &str) -> Result<ModuleInfo, ResolutionError>;

    /// Resolve one exported symbol of a located module.
    fn resolve(&self, module: &ModuleInfo, symbol: &SymbolName) -> Result<Address, ResolutionError>;

    /// Build the export table for the `wanted` symbols, collecting misses
    /// instead of stopping at the first one.
    fn exports(
        &self,
        module: &ModuleInfo,
        wanted: &[SymbolName],
    ) -> (ExportTable, Vec<ResolutionError>) {
        let mut table = ExportTable::new(module.name.clone());
        let mut missing = Vec::new();
        for symbol in wanted {
            match self.resolve(module, symbol) {
                Ok(address) => table.push(symbol.clone(), address),
                Err(e) => missing.push(e),
            }
        }
        (table, missing)
    }
}

/// Resolver over fixed in-memory tables.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    modules: HashMap<String, ExportTable>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under its own module name.
    pub fn insert(&mut self, table: ExportTable) {
        self.modules.insert(table.module().to_string(), table);
    }

    pub fn with_table(mut self, table: ExportTable) -> Self {
        self.insert(table);
        self
    }
}

impl ModuleResolver for StaticResolver {
    fn find_module(&self, module: &str) -> Result<ModuleInfo, ResolutionError> {
        if self.modules.contains_key(module) {
            Ok(ModuleInfo {
                name: module.to_string(),
                path: None,
                base: None,
            })
        } else {
            Err(ResolutionError::ModuleNotFound {
                module: module.to_string(),
            })
        }
    }

    fn resolve(&self, module: &ModuleInfo, symbol: &SymbolName) -> Result<Address, ResolutionError> {
        self.modules
            .get(&module.name)
            .and_then(|table| table.find(symbol.as_str()))
            .ok_or_else(|| ResolutionError::SymbolNotFound {
                module: module.name.clone(),
                symbol: symbol.clone(),
            })
    }
}

/// Arguments seen at function entry, as raw machine words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallArgs {
    words: [i64; CallArgs::MAX],
    len: usize,
}

impl CallArgs {
    /// Register arguments carried per call.
    pub const MAX: usize = 4;

    /// Build from up to [`CallArgs::MAX`] words; extra words are dropped.
    pub fn new(words: &[i64]) -> Self {
        let len = words.len().min(Self::MAX);
        let mut args = Self::default();
        args.words[..len].copy_from_slice(&words[..len]);
        args.len = len;
        args
    }

    pub fn ints(a: i32, b: i32) -> Self {
        Self::new(&[a as i64, b as i64])
    }

    /// Raw word `index`, zero past the end.
    pub fn word(&self, index: usize) -> i64 {
        if index < self.len {
            self.words[index]
        } else {
            0
        }
    }

    /// Word `index` truncated to a 32-bit signed integer.
    pub fn int(&self, index: usize) -> i32 {
        self.word(index) as i32
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Correlation handle produced by the entry stage and consumed by the exit
/// stage of the same invocation.
#[derive(Debug, Clone, Default)]
pub struct EntryToken {
    args: CallArgs,
    record: Option<ProbeCallRecord>,
}

impl EntryToken {
    pub fn new(args: CallArgs) -> Self {
        Self { args, record: None }
    }

    pub fn args(&self) -> &CallArgs {
        &self.args
    }

    /// Attach a workload record to this invocation. The latest one wins.
    pub fn attach_record(&mut self, record: ProbeCallRecord) {
        self.record = Some(record);
    }

    pub fn record(&self) -> Option<&ProbeCallRecord> {
        self.record.as_ref()
    }

    pub fn take_record(&mut self) -> Option<ProbeCallRecord> {
        self.record.take()
    }
}

/// Return value seen at function exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnValue {
    raw: i64,
    replaced: bool,
}

impl ReturnValue {
    pub fn new(raw: i64) -> Self {
        Self {
            raw,
            replaced: false,
        }
    }

    pub fn raw(&self) -> i64 {
        self.raw
    }

    pub fn is_replaced(&self) -> bool {
        self.replaced
    }

    /// Overwrite with a literal.
    pub fn replace(&mut self, value: i64) {
        self.raw = value;
        self.replaced = true;
    }

    /// Overwrite with a pointer to a process-lifetime C string.
    pub fn replace_with_str(&mut self, value: &'static CStr) {
        self.replace(value.as_ptr() as i64);
    }
}

/// Entry/exit callbacks bound to one attachment.
pub trait ProbeListener: Send + Sync {
    fn on_enter(&self, args: &CallArgs) -> EntryToken {
        EntryToken::new(*args)
    }

    fn on_leave(&self, _token: EntryToken, _ret: &mut ReturnValue) {}
}

/// Attachment machinery.
pub trait Interceptor: Send + Sync {
    fn attach(&self, target: Address, listener: Arc<dyn ProbeListener>) -> Result<(), AttachError>;

    fn detach(&self, target: Address) -> Result<(), AttachError>;

    fn is_attached(&self, target: Address) -> bool;

    /// Intern a replacement string for the life of the process.
    fn intern(&self, value: &str) -> Result<&'static CStr, HardValidationError>;
}

/// Interned NUL-terminated strings that live until process exit.
///
/// Interning keeps repeated rewrites with the same marker from allocating
/// on every call.
#[derive(Debug, Default)]
pub struct StringArena {
    strings: Mutex<HashMap<String, &'static CStr>>,
}

impl StringArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, value: &str) -> Result<&'static CStr, HardValidationError> {
        let mut strings = self.strings.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = strings.get(value) {
            return Ok(existing);
        }

        let owned = CString::new(value).map_err(|_| HardValidationError::InvalidFieldValue {
            field: "string_marker",
            value: value.escape_debug().to_string(),
            reason: "must not contain NUL bytes".to_string(),
        })?;
        let leaked: &'static CStr = Box::leak(owned.into_boxed_c_str());
        strings.insert(value.to_string(), leaked);
        Ok(leaked)
    }

    /// The interned string starting at `raw`, if this arena owns it.
    pub fn lookup(&self, raw: i64) -> Option<&'static CStr> {
        let ptr = raw as *const c_char;
        self.strings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|s| s.as_ptr() == ptr)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.strings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read back a string pointer produced by [`ReturnValue::replace_with_str`]
/// or returned by a string-returning target.
///
/// # Safety
///
/// `raw` must be null or point to a NUL-terminated string that outlives `'a`.
pub unsafe fn c_str_from_word<'a>(raw: i64) -> Option<&'a CStr> {
    let ptr = raw as *const c_char;
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr))
    }
}

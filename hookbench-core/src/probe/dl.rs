// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Dynamic-loader backed resolver.
//!
//! Module discovery walks the loader's list with `dl_iterate_phdr`; symbol
//! lookup reopens the already-loaded object with `RTLD_NOLOAD` and asks
//! `dlsym`. Nothing is ever loaded by this resolver.

use std::ffi::{c_int, c_void, CStr, CString, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::error::ResolutionError;
use crate::probe::{ModuleInfo, ModuleResolver};
use crate::types::{Address, SymbolName};

/// One entry of the loader's module list.
#[derive(Debug, Clone)]
struct LoadedObject {
    /// Empty for the main executable.
    path: PathBuf,
    base: usize,
}

/// Resolver over the modules currently mapped into this process.
#[derive(Debug, Clone, Copy, Default)]
pub struct DlResolver;

impl DlResolver {
    pub fn new() -> Self {
        Self
    }

    /// File names of every loaded module, main executable included.
    pub fn loaded_module_names(&self) -> Vec<String> {
        loaded_objects()
            .iter()
            .map(|o| display_name(&o.path))
            .collect()
    }
}

impl ModuleResolver for DlResolver {
    fn find_module(&self, module: &str) -> Result<ModuleInfo, ResolutionError> {
        loaded_objects()
            .into_iter()
            .find(|o| matches_module(&display_name(&o.path), module))
            .map(|o| ModuleInfo {
                name: module.to_string(),
                path: (!o.path.as_os_str().is_empty()).then_some(o.path),
                base: Address::new(o.base).ok(),
            })
            .ok_or_else(|| ResolutionError::ModuleNotFound {
                module: module.to_string(),
            })
    }

    fn resolve(&self, module: &ModuleInfo, symbol: &SymbolName) -> Result<Address, ResolutionError> {
        let not_found = || ResolutionError::SymbolNotFound {
            module: module.name.clone(),
            symbol: symbol.clone(),
        };

        let path = match &module.path {
            Some(path) => Some(CString::new(path.as_os_str().as_bytes()).map_err(|_| not_found())?),
            None => None,
        };
        // SymbolName is a validated C identifier, so it holds no NUL.
        let name = CString::new(symbol.as_str()).map_err(|_| not_found())?;

        // SAFETY: both strings are NUL-terminated and outlive the calls;
        // RTLD_NOLOAD never maps anything new, and the reference taken by
        // dlopen is released before returning.
        let raw = unsafe {
            let handle = libc::dlopen(
                path.as_ref().map_or(std::ptr::null(), |p| p.as_ptr()),
                libc::RTLD_NOLOAD | libc::RTLD_LAZY,
            );
            if handle.is_null() {
                return Err(ResolutionError::ModuleNotFound {
                    module: module.name.clone(),
                });
            }
            let sym = libc::dlsym(handle, name.as_ptr());
            libc::dlclose(handle);
            sym
        };

        Address::from_ptr(raw as *const c_void).map_err(|_| not_found())
    }
}

/// `libfoo.so` matches itself and any versioned `libfoo.so.N`.
fn matches_module(file_name: &str, wanted: &str) -> bool {
    file_name == wanted
        || file_name
            .strip_prefix(wanted)
            .is_some_and(|rest| rest.starts_with('.'))
}

fn display_name(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        return std::env::current_exe()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_default();
    }
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn loaded_objects() -> Vec<LoadedObject> {
    unsafe extern "C" fn collect(
        info: *mut libc::dl_phdr_info,
        _size: libc::size_t,
        data: *mut c_void,
    ) -> c_int {
        // SAFETY: `data` is the Vec passed below and `info` is valid for the
        // duration of the callback.
        let objects = &mut *(data as *mut Vec<LoadedObject>);
        let info = &*info;
        let path = if info.dlpi_name.is_null() {
            PathBuf::new()
        } else {
            PathBuf::from(OsStr::from_bytes(CStr::from_ptr(info.dlpi_name).to_bytes()))
        };
        objects.push(LoadedObject {
            path,
            base: info.dlpi_addr as usize,
        });
        0
    }

    let mut objects: Vec<LoadedObject> = Vec::new();
    // SAFETY: the callback only touches `objects`, which outlives the call.
    unsafe {
        libc::dl_iterate_phdr(Some(collect), &mut objects as *mut Vec<LoadedObject> as *mut c_void);
    }
    objects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_module() {
        assert!(matches_module("libfuncs.so", "libfuncs.so"));
        assert!(matches_module("libc.so.6", "libc.so"));
        assert!(!matches_module("libfuncs.so", "libfunc"));
        assert!(!matches_module("libfuncs.so", "libfuncs.so.1"));
    }

    #[test]
    fn test_unknown_module() {
        let resolver = DlResolver::new();
        assert_eq!(
            resolver.find_module("libdefinitely_not_loaded.so"),
            Err(ResolutionError::ModuleNotFound {
                module: "libdefinitely_not_loaded.so".to_string()
            })
        );
    }

    #[test]
    fn test_lists_main_executable() {
        let names = DlResolver::new().loaded_module_names();
        assert!(!names.is_empty());
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn test_resolves_libc_symbol() {
        let resolver = DlResolver::new();
        let module = resolver.find_module("libc.so").unwrap();
        let getpid = SymbolName::new("getpid").unwrap();
        assert!(resolver.resolve(&module, &getpid).is_ok());

        let bogus = SymbolName::new("hookbench_no_such_symbol").unwrap();
        assert!(matches!(
            resolver.resolve(&module, &bogus),
            Err(ResolutionError::SymbolNotFound { .. })
        ));
    }
}

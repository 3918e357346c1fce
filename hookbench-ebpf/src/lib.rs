// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Hookbench eBPF Backend Library
//!
//! Kernel-side probe counting for exported functions of a target library.
//! Uses Aya to load a compiled BPF object holding one uprobe and one
//! uretprobe program, attaches them to named symbols, and reads per-address
//! hit counts back out of BPF hash maps.
//!
//! Contract with the BPF object:
//!
//! | item | name | shape |
//! |---|---|---|
//! | entry program | `hookbench_entry` | uprobe, bumps `entry_hits[ip]` |
//! | return program | `hookbench_return` | uretprobe, bumps `return_hits[entry ip]` |
//! | maps | `entry_hits`, `return_hits` | `HashMap<u64, u64>` |
//!
//! Counts are keyed by the probed function's address in the traced process,
//! so attributing them to symbols needs the caller to supply that address.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aya::maps::HashMap as BpfHashMap;
use aya::programs::uprobe::UProbeLinkId;
use aya::programs::UProbe;
use aya::Ebpf;
use tokio::sync::RwLock;

use hookbench_core::{Address, EbpfError, HookError, HookResult, ProcessId, SymbolName};

/// Uprobe program section in the BPF object.
pub const ENTRY_PROGRAM: &str = "hookbench_entry";

/// Uretprobe program section in the BPF object.
pub const RETURN_PROGRAM: &str = "hookbench_return";

/// Entry counts by probed address.
pub const ENTRY_HITS_MAP: &str = "entry_hits";

/// Return counts by probed address.
pub const RETURN_HITS_MAP: &str = "return_hits";

/// Which side of a call a probe fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    Entry,
    Return,
}

impl ProbeKind {
    pub fn program(&self) -> &'static str {
        match self {
            Self::Entry => ENTRY_PROGRAM,
            Self::Return => RETURN_PROGRAM,
        }
    }

    pub fn map(&self) -> &'static str {
        match self {
            Self::Entry => ENTRY_HITS_MAP,
            Self::Return => RETURN_HITS_MAP,
        }
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entry => write!(f, "uprobe"),
            Self::Return => write!(f, "uretprobe"),
        }
    }
}

/// Userspace record of one probed symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisteredProbe {
    /// Address of the symbol in the traced process, if known.
    pub address: Option<Address>,
    pub entry: bool,
    pub ret: bool,
}

/// Hit counts attributed to one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolHits {
    pub symbol: SymbolName,
    pub entries: u64,
    pub returns: u64,
}

/// eBPF program manager for uprobe-based call counting.
///
/// Manages the lifecycle of the uprobe programs and their links, and keeps
/// a userspace mirror of which symbols are probed.
#[derive(Debug)]
pub struct UprobeManager {
    /// The loaded BPF object (None if not loaded).
    bpf: Option<Ebpf>,
    /// Probed symbols (userspace mirror).
    probes: Arc<RwLock<HashMap<SymbolName, RegisteredProbe>>>,
    /// Active links, for per-symbol detach.
    links: HashMap<(SymbolName, ProbeKind), UProbeLinkId>,
    /// Library or executable the probes are placed in.
    target: PathBuf,
    /// Process to trace; None traces every process mapping the target.
    pid: Option<ProcessId>,
    /// Whether the programs are loaded.
    loaded: bool,
}

impl UprobeManager {
    /// Create a new manager for probes placed in `target`.
    ///
    /// # Arguments
    /// * `target` - Path of the library or executable to probe
    /// * `pid` - Restrict probes to one process
    pub fn new(target: impl Into<PathBuf>, pid: Option<ProcessId>) -> Self {
        Self {
            bpf: None,
            probes: Arc::new(RwLock::new(HashMap::new())),
            links: HashMap::new(),
            target: target.into(),
            pid,
            loaded: false,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn pid(&self) -> Option<ProcessId> {
        self.pid
    }

    /// Check if the probe programs are loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Load both probe programs from a BPF object file.
    ///
    /// # Errors
    /// Returns EbpfError if loading fails.
    ///
    /// # Privileges
    /// Requires CAP_BPF and CAP_PERFMON capabilities (typically root).
    pub fn load_program<P: AsRef<Path>>(&mut self, object_path: P) -> HookResult<()> {
        let path = object_path.as_ref();

        let mut bpf = Ebpf::load_file(path).map_err(|e| {
            HookError::Ebpf(EbpfError::LoadFailed {
                reason: format!("Failed to load BPF object '{}': {}", path.display(), e),
            })
        })?;

        if let Err(e) = aya_log::EbpfLogger::init(&mut bpf) {
            // Objects built without aya-log have nothing to forward.
            tracing::debug!(error = %e, "BPF logger not initialised");
        }

        for name in [ENTRY_PROGRAM, RETURN_PROGRAM] {
            Self::uprobe_mut(&mut bpf, name)?.load().map_err(|e| {
                HookError::Ebpf(EbpfError::LoadFailed {
                    reason: format!("Failed to load program '{}': {}", name, e),
                })
            })?;
        }

        tracing::info!(
            object = %path.display(),
            target = %self.target.display(),
            "Uprobe programs loaded"
        );

        self.bpf = Some(bpf);
        self.loaded = true;

        // Probes registered before load get attached now.
        let pending: Vec<(SymbolName, RegisteredProbe)> = self
            .probes
            .try_read()
            .map(|p| p.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        for (symbol, probe) in pending {
            if probe.entry {
                self.attach_link(&symbol, ProbeKind::Entry)?;
            }
            if probe.ret {
                self.attach_link(&symbol, ProbeKind::Return)?;
            }
        }

        Ok(())
    }

    /// Probe `symbol` on `kind`.
    ///
    /// # Arguments
    /// * `symbol` - Exported symbol in the target
    /// * `address` - Its address in the traced process, for attributing counts
    /// * `kind` - Entry or return
    pub async fn attach(
        &mut self,
        symbol: &SymbolName,
        address: Option<Address>,
        kind: ProbeKind,
    ) -> HookResult<()> {
        // Update userspace mirror
        {
            let mut probes = self.probes.write().await;
            let probe = probes.entry(symbol.clone()).or_default();
            if address.is_some() {
                probe.address = address;
            }
            match kind {
                ProbeKind::Entry => probe.entry = true,
                ProbeKind::Return => probe.ret = true,
            }
        }

        // Attach in the kernel if loaded
        if self.loaded {
            self.attach_link(symbol, kind)?;
        }

        tracing::info!(symbol = %symbol, kind = %kind, "Registered probe");
        Ok(())
    }

    /// Remove every probe on `symbol`.
    pub async fn detach_symbol(&mut self, symbol: &SymbolName) -> HookResult<()> {
        {
            let mut probes = self.probes.write().await;
            probes.remove(symbol);
        }

        for kind in [ProbeKind::Entry, ProbeKind::Return] {
            let Some(link) = self.links.remove(&(symbol.clone(), kind)) else {
                continue;
            };
            if let Some(ref mut bpf) = self.bpf {
                // Ignore error if the link is already gone
                let _ = Self::uprobe_mut(bpf, kind.program())?.detach(link);
            }
        }

        tracing::info!(symbol = %symbol, "Removed probes");
        Ok(())
    }

    /// All probed symbols, sorted by name.
    pub async fn list_probes(&self) -> Vec<(SymbolName, RegisteredProbe)> {
        let probes = self.probes.read().await;
        let mut list: Vec<_> = probes.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        list.sort_by(|a, b| a.0.cmp(&b.0));
        list
    }

    /// Raw counts from one hit map, keyed by probed address.
    pub fn read_hits(&self, kind: ProbeKind) -> HookResult<HashMap<u64, u64>> {
        let bpf = self
            .bpf
            .as_ref()
            .ok_or(HookError::Ebpf(EbpfError::NotLoaded))?;

        let map: BpfHashMap<_, u64, u64> =
            BpfHashMap::try_from(bpf.map(kind.map()).ok_or_else(|| {
                HookError::Ebpf(EbpfError::MapNotFound {
                    name: kind.map().to_string(),
                })
            })?)
            .map_err(|e| {
                HookError::Ebpf(EbpfError::MapOperationFailed {
                    operation: "open".to_string(),
                    reason: e.to_string(),
                })
            })?;

        let mut hits = HashMap::new();
        for item in map.iter() {
            let (address, count) = item.map_err(|e| {
                HookError::Ebpf(EbpfError::MapOperationFailed {
                    operation: "iterate".to_string(),
                    reason: e.to_string(),
                })
            })?;
            hits.insert(address, count);
        }
        Ok(hits)
    }

    /// Counts per probed symbol whose address is known.
    pub async fn symbol_hits(&self) -> HookResult<Vec<SymbolHits>> {
        let entries = self.read_hits(ProbeKind::Entry)?;
        let returns = self.read_hits(ProbeKind::Return)?;
        Ok(attribute_hits(&*self.probes.read().await, &entries, &returns))
    }

    /// Get statistics about the uprobe manager.
    pub async fn stats(&self) -> UprobeStats {
        let probes = self.probes.read().await;
        UprobeStats {
            target: self.target.clone(),
            pid: self.pid,
            loaded: self.loaded,
            probed_symbols: probes.len(),
            active_links: self.links.len(),
        }
    }

    /// Unload the programs, detaching every probe.
    pub fn detach(&mut self) {
        if self.loaded {
            // Links are detached when the Ebpf object is dropped
            self.links.clear();
            self.bpf = None;
            self.loaded = false;
            tracing::info!(target = %self.target.display(), "Uprobe programs detached");
        }
    }

    fn attach_link(&mut self, symbol: &SymbolName, kind: ProbeKind) -> HookResult<()> {
        if self.links.contains_key(&(symbol.clone(), kind)) {
            return Ok(());
        }
        let bpf = self
            .bpf
            .as_mut()
            .ok_or(HookError::Ebpf(EbpfError::NotLoaded))?;
        let pid = self.pid.map(|p| p.value() as libc::pid_t);

        let link = Self::uprobe_mut(bpf, kind.program())?
            .attach(Some(symbol.as_str()), 0, &self.target, pid)
            .map_err(|e| {
                HookError::Ebpf(EbpfError::AttachFailed {
                    symbol: symbol.to_string(),
                    target: self.target.display().to_string(),
                    reason: e.to_string(),
                })
            })?;

        self.links.insert((symbol.clone(), kind), link);
        tracing::debug!(symbol = %symbol, kind = %kind, "Attached");
        Ok(())
    }

    fn uprobe_mut<'a>(bpf: &'a mut Ebpf, name: &str) -> HookResult<&'a mut UProbe> {
        bpf.program_mut(name)
            .ok_or_else(|| {
                HookError::Ebpf(EbpfError::LoadFailed {
                    reason: format!("Program '{}' not found in BPF object", name),
                })
            })?
            .try_into()
            .map_err(|e: aya::programs::ProgramError| {
                HookError::Ebpf(EbpfError::LoadFailed {
                    reason: format!("Program '{}' has invalid type: {}", name, e),
                })
            })
    }
}

impl Drop for UprobeManager {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Join raw per-address counts with the probed symbols' addresses.
fn attribute_hits(
    probes: &HashMap<SymbolName, RegisteredProbe>,
    entries: &HashMap<u64, u64>,
    returns: &HashMap<u64, u64>,
) -> Vec<SymbolHits> {
    let mut hits: Vec<SymbolHits> = probes
        .iter()
        .filter_map(|(symbol, probe)| {
            let key = probe.address?.value() as u64;
            Some(SymbolHits {
                symbol: symbol.clone(),
                entries: entries.get(&key).copied().unwrap_or(0),
                returns: returns.get(&key).copied().unwrap_or(0),
            })
        })
        .collect();
    hits.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    hits
}

/// Statistics from the uprobe manager.
#[derive(Debug, Clone)]
pub struct UprobeStats {
    pub target: PathBuf,
    pub pid: Option<ProcessId>,
    pub loaded: bool,
    pub probed_symbols: usize,
    pub active_links: usize,
}

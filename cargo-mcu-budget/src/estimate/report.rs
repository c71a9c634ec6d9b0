//! Whole-graph report and device budget check.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::macs::{estimate_layer_macs, total_macs, LayerMacs};
use super::ram::{plan_memory, LayerMemory};
use super::rom::estimate_rom;
use crate::error::Result;
use crate::ir::{Graph, LayerId};

/// Storage limits of a target device. `None` leaves a resource unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBudget {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rom_bytes: Option<usize>,
    #[serde(default)]
    pub ram_bytes: Option<usize>,
}

impl DeviceBudget {
    /// Replaces the ROM/RAM limits with any that are given.
    pub fn with_limits(mut self, rom_bytes: Option<usize>, ram_bytes: Option<usize>) -> Self {
        if rom_bytes.is_some() {
            self.rom_bytes = rom_bytes;
        }
        if ram_bytes.is_some() {
            self.ram_bytes = ram_bytes;
        }
        self
    }

    /// `name`, or "target" for an unnamed budget.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "target"
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub layers: Vec<LayerMacs>,
    pub memory: Vec<LayerMemory>,
    pub total_macs: u64,
    pub rom_bytes: usize,
    pub ram_bytes: usize,
    pub peak_layer: Option<LayerId>,
}

impl Report {
    pub fn build(graph: &Graph) -> Result<Self> {
        let layers = estimate_layer_macs(graph)?;
        let total_macs = total_macs(&layers)?;
        let rom_bytes = estimate_rom(graph.tensors())?;
        let plan = plan_memory(graph.tensors(), graph.layers())?;

        Ok(Self {
            layers,
            memory: plan.layers,
            total_macs,
            rom_bytes,
            ram_bytes: plan.peak_bytes,
            peak_layer: plan.peak_layer,
        })
    }

    pub fn check(&self, budget: &DeviceBudget) -> BudgetCheck {
        BudgetCheck {
            device: budget.display_name().to_string(),
            rom: budget.rom_bytes.map(|limit| Fit::new(self.rom_bytes, limit)),
            ram: budget.ram_bytes.map(|limit| Fit::new(self.ram_bytes, limit)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fit {
    pub used: usize,
    pub limit: usize,
    /// `limit - used`; negative when over budget
    pub headroom: i128,
}

impl Fit {
    fn new(used: usize, limit: usize) -> Self {
        Self {
            used,
            limit,
            headroom: limit as i128 - used as i128,
        }
    }

    pub fn fits(&self) -> bool {
        self.used <= self.limit
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetCheck {
    pub device: String,
    pub rom: Option<Fit>,
    pub ram: Option<Fit>,
}

impl BudgetCheck {
    pub fn fits(&self) -> bool {
        self.rom.map_or(true, |f| f.fits()) && self.ram.map_or(true, |f| f.fits())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>3}  {:<24} {:<18} {:>12} {:>10}",
            "#", "layer", "op", "MACs", "RAM"
        )?;
        for (row, mem) in self.layers.iter().zip(&self.memory) {
            writeln!(
                f,
                "{:>3}  {:<24} {:<18} {:>12} {:>10}",
                row.layer,
                row.name,
                row.op.unwrap_or("-"),
                row.macs,
                mem.live_bytes
            )?;
        }
        writeln!(f)?;
        writeln!(f, "total MACs: {}", self.total_macs)?;
        writeln!(f, "ROM: {} bytes", self.rom_bytes)?;
        match self.peak_layer.and_then(|i| self.layers.get(i)) {
            Some(peak) => writeln!(
                f,
                "RAM: {} bytes (peak at layer {} '{}')",
                self.ram_bytes, peak.layer, peak.name
            ),
            None => writeln!(f, "RAM: {} bytes", self.ram_bytes),
        }
    }
}

impl fmt::Display for BudgetCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let device = &self.device;
        for (what, fit) in [("ROM", self.rom), ("RAM", self.ram)] {
            if let Some(fit) = fit {
                writeln!(
                    f,
                    "{device} {what}: {} / {} bytes ({}, headroom {})",
                    fit.used,
                    fit.limit,
                    if fit.fits() { "fits" } else { "OVER BUDGET" },
                    fit.headroom
                )?;
            }
        }
        Ok(())
    }
}

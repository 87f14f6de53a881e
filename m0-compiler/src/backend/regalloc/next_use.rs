//! Block-local register allocator driven by next-use distances.
//!
//! Values live in the target's saved registers (the scratch registers are
//! reserved for lowering sequences). A value is brought into a register only
//! when it will be read again inside the block; when no register is free,
//! the occupant needed farthest in the future is evicted. All bindings end
//! with the block.

use super::{Placement, RegAllocator};
use crate::backend::abi::{Register, TargetDesc};
use crate::backend::frame::FrameLayout;
use crate::backend::instruction::X86Instr;
use crate::backend::liveness::{NextUse, NextUseTable};
use crate::ir::Instr;
use std::collections::{HashMap, HashSet};

pub struct NextUseAllocator {
    /// Allocatable registers, in preference order.
    pool: Vec<Register>,
    /// Register descriptor: which slot each register holds.
    reg_to_slot: HashMap<Register, usize>,
    /// Address descriptor: which register holds each slot.
    slot_to_reg: HashMap<usize, Register>,
    /// Slots whose register copy is newer than memory.
    dirty: HashSet<usize>,
    table: Option<NextUseTable>,
}

impl NextUseAllocator {
    pub fn new(target: &TargetDesc) -> Self {
        Self {
            pool: target.saved_regs.clone(),
            reg_to_slot: HashMap::new(),
            slot_to_reg: HashMap::new(),
            dirty: HashSet::new(),
            table: None,
        }
    }

    fn next_use(&self, idx: usize, slot: usize) -> NextUse {
        self.table
            .as_ref()
            .map_or(NextUse::LiveOnExit, |t| t.next_use(idx, slot))
    }

    fn bind(&mut self, slot: usize, reg: Register) {
        self.reg_to_slot.insert(reg, slot);
        self.slot_to_reg.insert(slot, reg);
    }

    fn unbind(&mut self, reg: Register) -> Option<usize> {
        let slot = self.reg_to_slot.remove(&reg)?;
        self.slot_to_reg.remove(&slot);
        self.dirty.remove(&slot);
        Some(slot)
    }

    fn write_back(&self, reg: Register, slot: usize, frame: &FrameLayout, out: &mut Vec<X86Instr>) {
        log::trace!("write back slot {slot} from {reg}");
        out.push(X86Instr::mov(reg, frame.slot_operand(slot)));
    }

    /// Pick the occupant to evict: a dead value if there is one, otherwise
    /// the value whose next use is farthest away. Registers in `busy` hold
    /// operands of the current instruction and are never chosen.
    fn find_victim(&self, idx: usize, busy: &HashSet<Register>) -> Option<Register> {
        let mut best: Option<(Register, NextUse)> = None;

        for &reg in &self.pool {
            if busy.contains(&reg) {
                continue;
            }
            let Some(&slot) = self.reg_to_slot.get(&reg) else {
                continue;
            };
            let next = self.next_use(idx, slot);
            if next.is_dead() {
                return Some(reg);
            }
            let is_better = match best {
                None => true,
                Some((_, best_next)) => next.distance() > best_next.distance(),
            };
            if is_better {
                best = Some((reg, next));
            }
        }

        best.map(|(reg, _)| reg)
    }

    /// A register for a new value: a free one, or an evicted one.
    fn acquire(
        &mut self,
        idx: usize,
        busy: &HashSet<Register>,
        frame: &FrameLayout,
        out: &mut Vec<X86Instr>,
    ) -> Option<Register> {
        let free = self
            .pool
            .iter()
            .copied()
            .find(|r| !busy.contains(r) && !self.reg_to_slot.contains_key(r));
        if free.is_some() {
            return free;
        }

        let victim = self.find_victim(idx, busy)?;
        let slot = self.reg_to_slot.get(&victim).copied();
        if let Some(slot) = slot {
            let needed = !self.next_use(idx, slot).is_dead();
            if needed && self.dirty.contains(&slot) {
                self.write_back(victim, slot, frame, out);
            }
            log::trace!("evict slot {slot} from {victim}");
        }
        self.unbind(victim);
        Some(victim)
    }
}

impl RegAllocator for NextUseAllocator {
    fn begin_block(&mut self, table: NextUseTable) {
        self.reg_to_slot.clear();
        self.slot_to_reg.clear();
        self.dirty.clear();
        self.table = Some(table);
    }

    fn place(
        &mut self,
        idx: usize,
        instr: &Instr,
        frame: &FrameLayout,
        out: &mut Vec<X86Instr>,
    ) -> Placement {
        let mut placement = Placement::memory();
        let uses: Vec<usize> = instr.uses().into_iter().filter_map(|a| frame.slot_of(a)).collect();
        let def = instr.def().and_then(|a| frame.slot_of(a));

        // Registers already holding an operand of this instruction.
        let mut busy: HashSet<Register> = uses
            .iter()
            .chain(def.iter())
            .filter_map(|slot| self.slot_to_reg.get(slot).copied())
            .collect();

        for &slot in &uses {
            if let Some(&reg) = self.slot_to_reg.get(&slot) {
                placement.add_use(slot, reg);
                continue;
            }
            // Only worth a register if it is read again in this block.
            if !matches!(self.next_use(idx, slot), NextUse::At(_)) {
                continue;
            }
            if let Some(reg) = self.acquire(idx, &busy, frame, out) {
                log::trace!("load slot {slot} into {reg}");
                out.push(X86Instr::mov(frame.slot_operand(slot), reg));
                self.bind(slot, reg);
                busy.insert(reg);
                placement.add_use(slot, reg);
            }
        }

        if let Some(slot) = def {
            if matches!(self.next_use(idx, slot), NextUse::At(_)) {
                let reg = match self.slot_to_reg.get(&slot) {
                    Some(&reg) => Some(reg),
                    None => self.acquire(idx, &busy, frame, out),
                };
                if let Some(reg) = reg {
                    log::trace!("define slot {slot} in {reg}");
                    self.bind(slot, reg);
                    self.dirty.insert(slot);
                    placement.set_def(slot, reg);
                }
            } else if let Some(&reg) = self.slot_to_reg.get(&slot) {
                // The instruction writes memory; the register copy goes stale.
                self.unbind(reg);
            }
        }

        placement
    }

    fn after_instr(&mut self, idx: usize, frame: &FrameLayout, out: &mut Vec<X86Instr>) {
        for reg in self.pool.clone() {
            let Some(&slot) = self.reg_to_slot.get(&reg) else {
                continue;
            };
            match self.next_use(idx, slot) {
                NextUse::At(_) => {}
                NextUse::Dead => {
                    self.unbind(reg);
                }
                NextUse::LiveOnExit => {
                    if self.dirty.contains(&slot) {
                        self.write_back(reg, slot, frame, out);
                    }
                    self.unbind(reg);
                }
            }
        }
    }

    fn flush_before_branch(&mut self, idx: usize, frame: &FrameLayout, out: &mut Vec<X86Instr>) {
        for reg in self.pool.clone() {
            let Some(&slot) = self.reg_to_slot.get(&reg) else {
                continue;
            };
            if self.dirty.contains(&slot) && !self.next_use(idx, slot).is_dead() {
                self.write_back(reg, slot, frame, out);
                self.dirty.remove(&slot);
            }
        }
    }

    fn discard(&mut self) {
        self.reg_to_slot.clear();
        self.slot_to_reg.clear();
        self.dirty.clear();
    }

    fn end_block(&mut self) {
        debug_assert!(
            self.dirty.is_empty(),
            "dirty values left in registers at block end"
        );
        self.discard();
        self.table = None;
    }
}

/// The baseline code generator: lowers one IR unit to bytecode.
///
/// Allocation is deliberately trivial. IR value N lives in physical register
/// N, and every variable gets its own stack slot. Only a curated subset of
/// the IR is supported; anything else is rejected rather than miscompiled.

use crate::error::{Error, Result};
use crate::ir::*;

use assembler::traits::*;
use assembler::{Assembler, Bytecode, Cond, LabelId, Machine, Register};

use bit_vec::BitVec;
use fnv::FnvHashMap;

/// Width of a variable's stack slot in bytes.
pub const SLOT_SIZE: usize = 4;

pub fn compile(machine: &Machine, unit: &Unit) -> Result<Bytecode> {
    debug!("compile {}: {} blocks, {} values, {} vars",
           unit.name(),
           unit.blocks().len(),
           unit.num_values(),
           unit.vars().len());

    let mut uc = UnitCompiler::new(machine, unit);
    uc.compile_blocks()?;
    uc.finish()
}

pub fn cond_for_cmp(kind: CmpKind) -> Cond {
    match kind {
        CmpKind::Eq => Cond::EQ,
        CmpKind::Neq => Cond::NE,
        CmpKind::Lt => Cond::LT,
        CmpKind::Leq => Cond::LE,
        CmpKind::Gt => Cond::GT,
        CmpKind::Geq => Cond::GE,
    }
}

struct UnitCompiler<'a> {
    asm: Assembler,
    unit: &'a Unit,
    block_labels: Vec<LabelId>,
    bound: BitVec,
    var_slots: FnvHashMap<VarId, i16>,
}

impl<'a> UnitCompiler<'a> {
    fn new(machine: &Machine, unit: &'a Unit) -> Self {
        let mut asm = Assembler::new(machine);

        // One label per block up front, so any branch has a target.
        let block_labels = unit.blocks().iter().map(|_| asm.new_label()).collect();

        let mut var_slots = FnvHashMap::default();
        for var in unit.var_ids() {
            let offset = asm.alloc_frame(SLOT_SIZE);
            assert!(offset <= i16::max_value() as usize, "Frame too large");
            trace!("{} @ SP+{}", unit.vars()[var.0].name(), offset);
            var_slots.insert(var, offset as i16);
        }

        UnitCompiler {
            asm: asm,
            unit: unit,
            block_labels: block_labels,
            bound: BitVec::from_elem(unit.blocks().len(), false),
            var_slots: var_slots,
        }
    }

    fn finish(self) -> Result<Bytecode> {
        assert!(self.bound.all(), "{}: block label left unbound", self.unit.name());
        Ok(self.asm.finish()?)
    }

    fn map_value(&self, v: ValueId) -> Register {
        assert!(v.0 < self.unit.num_values(), "{}: no value {:?}", self.unit.name(), v);
        let machine = self.asm.machine();
        // The stack pointer can't double as a value register.
        assert!(v.0 != machine.sp_reg().index(),
                "{}: {:?} would live in SP on {}",
                self.unit.name(),
                v,
                machine.name());
        machine.reg(v.0)
    }

    fn map_var(&self, var: Option<VarId>) -> i16 {
        match var.and_then(|v| self.var_slots.get(&v)) {
            Some(&offset) => offset,
            None => panic!("{}: bad variable {:?}", self.unit.name(), var),
        }
    }

    fn block_label(&self, b: BlockId) -> LabelId {
        assert!(b.0 < self.block_labels.len(), "{}: no block {:?}", self.unit.name(), b);
        self.block_labels[b.0]
    }

    fn result(&self, op: &Op) -> Register {
        match op.result() {
            Some(v) => self.map_value(v),
            None => panic!("{} op without a result", op.kind()),
        }
    }

    fn literal(&self, op: &Op) -> i32 {
        match op.value() {
            Some(value) => value,
            None => panic!("{} op without a value", op.kind()),
        }
    }

    fn compile_blocks(&mut self) -> Result<()> {
        let unit = self.unit;
        for (ix, block) in unit.blocks().iter().enumerate() {
            assert!(!self.bound[ix]);
            self.asm.bind(self.block_labels[ix]);
            self.bound.set(ix, true);

            for op in block.ops() {
                self.compile_op(op)?;
            }
        }
        Ok(())
    }

    fn compile_op(&mut self, op: &Op) -> Result<()> {
        trace!("{:04} {} {:?} <- {:?}", self.asm.here(), op.kind(), op.result(), op.args());

        match op.kind() {
            OpKind::Const => {
                let dst = self.result(op);
                let value = self.literal(op);
                self.asm.mov(dst, value);
            }
            OpKind::AddI => {
                let dst = self.result(op);
                let src = self.map_value(op.arg(0));
                let value = self.literal(op);
                // The copy is emitted even when dst == src.
                self.asm.mov(dst, src).add(dst, value);
            }
            OpKind::Mul => {
                let dst = self.result(op);
                let lhs = self.map_value(op.arg(0));
                let rhs = self.map_value(op.arg(1));
                self.asm.mov(dst, lhs).mul(dst, rhs);
            }
            OpKind::Cmp => {
                let dst = self.result(op);
                let lhs = self.map_value(op.arg(0));
                let rhs = self.map_value(op.arg(1));
                let cond = match op.cmp() {
                    Some(kind) => cond_for_cmp(kind),
                    None => panic!("cmp op without a comparison kind"),
                };
                self.asm.cmp(lhs, rhs).cset(dst, cond);
            }
            OpKind::Return => {
                let value = self.map_value(op.arg(0));
                let result_reg = self.asm.machine().result_reg();
                if value != result_reg {
                    self.asm.mov(result_reg, value);
                }
                self.asm.ret();
            }
            OpKind::Store => {
                let sp = self.asm.sp();
                let slot = self.map_var(op.var());
                let src = self.map_value(op.arg(0));
                self.asm.str(sp, slot, src);
            }
            OpKind::Load => {
                let sp = self.asm.sp();
                let dst = self.result(op);
                let slot = self.map_var(op.var());
                self.asm.ldr(dst, sp, slot);
            }
            OpKind::Jump => {
                let target = self.block_label(op.targets()[0]);
                self.asm.jmp(target);
            }
            OpKind::Cond => {
                let test = self.map_value(op.arg(0));
                let on_true = self.block_label(op.targets()[0]);
                let on_false = self.block_label(op.targets()[1]);
                // Never rely on block adjacency for the false edge.
                self.asm.cbnz(test, on_true).jmp(on_false);
            }
            OpKind::Comment => {
                trace!("; {}", op.comment().unwrap_or(""));
            }
            OpKind::DebugInfo | OpKind::RangeCheck => {}
            kind => {
                warn!("{}: unsupported op {}", self.unit.name(), kind);
                return Err(Error::Unsupported(kind));
            }
        }
        Ok(())
    }
}

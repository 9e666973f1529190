/// The bytecode interpreter. A single activation per `run`: no call stack,
/// no re-entrancy. Arguments are passed by seeding registers with `set_reg`
/// before the run.

use crate::config::Config;
use crate::error::{Error, Result};

use assembler::decode::{decode_at, Instr};
use assembler::disasm::format_instr;
use assembler::{Bytecode, Cond, Machine, OpCode};

use byteorder::{ByteOrder, LittleEndian};

pub type Reg = i32;

const WORD_SIZE: usize = 4;

pub struct Interpreter {
    regs: Vec<Reg>,
    flags: Cond,
    stack: Vec<u8>,
    max_frame_size: usize,
}

impl Interpreter {
    pub fn new(machine: &Machine) -> Self {
        Interpreter::with_config(machine, &Config::default())
    }

    pub fn with_config(machine: &Machine, config: &Config) -> Self {
        Interpreter {
            regs: vec![0; machine.num_regs()],
            flags: Cond::from_bits(0),
            stack: vec![],
            max_frame_size: config.max_frame_size,
        }
    }

    pub fn get_reg(&self, num: usize) -> Reg {
        assert!(num < self.regs.len(), "No register {}", num);
        self.regs[num]
    }

    pub fn set_reg(&mut self, num: usize, value: Reg) {
        assert!(num < self.regs.len(), "No register {}", num);
        self.regs[num] = value;
    }

    pub fn flags(&self) -> Cond {
        self.flags
    }

    /// Runs `code` until it returns, yielding the result register.
    pub fn run(&mut self, code: &Bytecode) -> Result<Reg> {
        let res = self.execute(code);
        if let Err(ref e) = res {
            debug!("{} while running:\n{}", e, code);
        }
        res
    }

    fn execute(&mut self, code: &Bytecode) -> Result<Reg> {
        assert!(code.machine().num_regs() <= self.regs.len(),
                "Bytecode for {} needs {} registers",
                code.machine().name(),
                code.machine().num_regs());

        if code.frame_size() > self.max_frame_size {
            return Err(Error::FrameTooLarge {
                size: code.frame_size(),
                limit: self.max_frame_size,
            });
        }
        self.flags = Cond::from_bits(0);
        self.stack.clear();
        self.stack.resize(code.frame_size(), 0);
        let machine = code.machine();
        // The frame starts at the bottom of the stack.
        self.regs[machine.sp_reg().index()] = 0;

        let bytes = code.bytes();
        let mut pc = 0;
        loop {
            let instr = decode_at(machine, bytes, pc)?;
            trace!("{}", format_instr(machine, bytes, &instr));
            pc = instr.next();

            match instr.opcode() {
                OpCode::Nop => {}
                OpCode::Movb | OpCode::Movw => {
                    self.regs[instr.reg(0).index()] = instr.arg(1);
                }
                OpCode::Mov => {
                    self.regs[instr.reg(0).index()] = self.regs[instr.reg(1).index()];
                }
                OpCode::Addb | OpCode::Addw => {
                    let a = instr.reg(0).index();
                    self.regs[a] = self.regs[a].wrapping_add(instr.arg(1));
                }
                OpCode::Add => {
                    let a = instr.reg(0).index();
                    self.regs[a] = self.regs[a].wrapping_add(self.regs[instr.reg(1).index()]);
                }
                OpCode::Mul => {
                    let a = instr.reg(0).index();
                    self.regs[a] = self.regs[a].wrapping_mul(self.regs[instr.reg(1).index()]);
                }
                OpCode::Str => {
                    let addr = self.address(&instr, 0)?;
                    let value = self.regs[instr.reg(2).index()];
                    LittleEndian::write_i32(&mut self.stack[addr..addr + WORD_SIZE], value);
                }
                OpCode::Ldr => {
                    let addr = self.address(&instr, 1)?;
                    self.regs[instr.reg(0).index()] =
                        LittleEndian::read_i32(&self.stack[addr..addr + WORD_SIZE]);
                }
                OpCode::Cmp => {
                    self.flags = Cond::compare(self.regs[instr.reg(0).index()],
                                               self.regs[instr.reg(1).index()]);
                }
                OpCode::Cset => {
                    self.regs[instr.reg(0).index()] = self.flags.contains(instr.cond(1)) as Reg;
                }
                OpCode::Jmp => {
                    pc = self.target(&instr);
                }
                OpCode::Cbnz => {
                    if self.regs[instr.reg(0).index()] != 0 {
                        pc = self.target(&instr);
                    }
                }
                OpCode::Cbz => {
                    if self.regs[instr.reg(0).index()] == 0 {
                        pc = self.target(&instr);
                    }
                }
                OpCode::Ret => {
                    return Ok(self.regs[machine.result_reg().index()]);
                }
            }
        }
    }

    fn target(&self, instr: &Instr) -> usize {
        match instr.branch_target() {
            Some(target) => target,
            None => panic!("{:?} is not a branch", instr.opcode()),
        }
    }

    // Byte address of the `[base + offset]` operand starting at `ix`.
    fn address(&self, instr: &Instr, ix: usize) -> Result<usize> {
        let base = self.regs[instr.reg(ix).index()] as i64;
        let addr = base + instr.arg(ix + 1) as i64;
        if addr < 0 || addr as usize + WORD_SIZE > self.stack.len() {
            return Err(Error::StackOutOfBounds {
                addr: addr,
                frame_size: self.stack.len(),
            });
        }
        Ok(addr as usize)
    }
}

/// The IR consumed by the code generator: a unit is an ordered list of basic
/// blocks over abstract values, with a set of stack-resident variables.
/// Units are produced upstream; `UnitBuilder` is the construction API.

use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ValueId(pub usize);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BlockId(pub usize);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct VarId(pub usize);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum OpKind {
    Const,
    AddI,
    Add,
    Sub,
    Mul,
    Div,
    Cmp,
    Return,
    Store,
    Load,
    Jump,
    Cond,
    Call,
    Comment,
    DebugInfo,
    RangeCheck,
}

impl OpKind {
    pub fn name(self) -> &'static str {
        use self::OpKind::*;

        match self {
            Const => "const",
            AddI => "addi",
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            Div => "div",
            Cmp => "cmp",
            Return => "return",
            Store => "store",
            Load => "load",
            Jump => "jump",
            Cond => "cond",
            Call => "fcall",
            Comment => "comment",
            DebugInfo => "debug info",
            RangeCheck => "range check",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CmpKind {
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
}

#[derive(Debug, Clone)]
pub struct Op {
    kind: OpKind,
    result: Option<ValueId>,
    args: Vec<ValueId>,
    value: Option<i32>,
    cmp: Option<CmpKind>,
    targets: Vec<BlockId>,
    var: Option<VarId>,
    comment: Option<String>,
}

impl Op {
    fn new(kind: OpKind) -> Self {
        Op {
            kind: kind,
            result: None,
            args: vec![],
            value: None,
            cmp: None,
            targets: vec![],
            var: None,
            comment: None,
        }
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    pub fn result(&self) -> Option<ValueId> {
        self.result
    }

    pub fn args(&self) -> &[ValueId] {
        &self.args
    }

    pub fn arg(&self, ix: usize) -> ValueId {
        self.args[ix]
    }

    pub fn value(&self) -> Option<i32> {
        self.value
    }

    pub fn cmp(&self) -> Option<CmpKind> {
        self.cmp
    }

    pub fn targets(&self) -> &[BlockId] {
        &self.targets
    }

    pub fn var(&self) -> Option<VarId> {
        self.var
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_ref().map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    ops: Vec<Op>,
}

impl Block {
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }
}

#[derive(Debug, Clone)]
pub struct Var {
    name: String,
}

impl Var {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
pub struct Unit {
    name: String,
    params: Vec<ValueId>,
    vars: Vec<Var>,
    blocks: Vec<Block>,
    num_values: usize,
}

impl Unit {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ValueId] {
        &self.params
    }

    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    pub fn var_ids(&self) -> impl Iterator<Item = VarId> {
        (0..self.vars.len()).map(VarId)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn num_values(&self) -> usize {
        self.num_values
    }
}

/// Builds a `Unit` block by block. Block 0 is the entry and is selected
/// initially.
pub struct UnitBuilder {
    unit: Unit,
    current: BlockId,
}

impl UnitBuilder {
    pub fn new(name: &str) -> Self {
        UnitBuilder {
            unit: Unit {
                name: name.to_owned(),
                params: vec![],
                vars: vec![],
                blocks: vec![Block::default()],
                num_values: 0,
            },
            current: BlockId(0),
        }
    }

    pub fn finish(self) -> Unit {
        self.unit
    }

    fn fresh_value(&mut self) -> ValueId {
        self.unit.num_values += 1;
        ValueId(self.unit.num_values - 1)
    }

    fn push(&mut self, op: Op) -> Option<ValueId> {
        let result = op.result;
        self.unit.blocks[self.current.0].ops.push(op);
        result
    }

    fn push_value(&mut self, mut op: Op) -> ValueId {
        let v = self.fresh_value();
        op.result = Some(v);
        self.push(op);
        v
    }

    pub fn param(&mut self) -> ValueId {
        let v = self.fresh_value();
        self.unit.params.push(v);
        v
    }

    pub fn var(&mut self, name: &str) -> VarId {
        self.unit.vars.push(Var { name: name.to_owned() });
        VarId(self.unit.vars.len() - 1)
    }

    pub fn block(&mut self) -> BlockId {
        self.unit.blocks.push(Block::default());
        BlockId(self.unit.blocks.len() - 1)
    }

    pub fn select_block(&mut self, b: BlockId) {
        assert!(b.0 < self.unit.blocks.len());
        self.current = b;
    }

    pub fn const_(&mut self, value: i32) -> ValueId {
        let mut op = Op::new(OpKind::Const);
        op.value = Some(value);
        self.push_value(op)
    }

    pub fn addi(&mut self, src: ValueId, value: i32) -> ValueId {
        let mut op = Op::new(OpKind::AddI);
        op.args.push(src);
        op.value = Some(value);
        self.push_value(op)
    }

    fn binary(&mut self, kind: OpKind, lhs: ValueId, rhs: ValueId) -> ValueId {
        let mut op = Op::new(kind);
        op.args = vec![lhs, rhs];
        self.push_value(op)
    }

    pub fn add(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(OpKind::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(OpKind::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(OpKind::Mul, lhs, rhs)
    }

    pub fn div(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(OpKind::Div, lhs, rhs)
    }

    pub fn cmp(&mut self, kind: CmpKind, lhs: ValueId, rhs: ValueId) -> ValueId {
        let mut op = Op::new(OpKind::Cmp);
        op.args = vec![lhs, rhs];
        op.cmp = Some(kind);
        self.push_value(op)
    }

    pub fn ret(&mut self, value: ValueId) {
        let mut op = Op::new(OpKind::Return);
        op.args.push(value);
        self.push(op);
    }

    pub fn store(&mut self, var: VarId, value: ValueId) {
        let mut op = Op::new(OpKind::Store);
        op.args.push(value);
        op.var = Some(var);
        self.push(op);
    }

    pub fn load(&mut self, var: VarId) -> ValueId {
        let mut op = Op::new(OpKind::Load);
        op.var = Some(var);
        self.push_value(op)
    }

    pub fn jump(&mut self, target: BlockId) {
        let mut op = Op::new(OpKind::Jump);
        op.targets.push(target);
        self.push(op);
    }

    pub fn cond(&mut self, test: ValueId, on_true: BlockId, on_false: BlockId) {
        let mut op = Op::new(OpKind::Cond);
        op.args.push(test);
        op.targets = vec![on_true, on_false];
        self.push(op);
    }

    pub fn call(&mut self, args: &[ValueId]) -> ValueId {
        let mut op = Op::new(OpKind::Call);
        op.args = args.to_vec();
        self.push_value(op)
    }

    pub fn comment(&mut self, text: &str) {
        let mut op = Op::new(OpKind::Comment);
        op.comment = Some(text.to_owned());
        self.push(op);
    }

    pub fn debug_info(&mut self, line: i32) {
        let mut op = Op::new(OpKind::DebugInfo);
        op.value = Some(line);
        self.push(op);
    }

    /// A bounds check already proven to hold upstream.
    pub fn range_check(&mut self, value: ValueId, low: ValueId, high: ValueId) {
        let mut op = Op::new(OpKind::RangeCheck);
        op.args = vec![value, low, high];
        self.push(op);
    }
}

// Sample units shared by the driver and the tests.

/// `add1(x) = x + 1`
pub fn sample_add1() -> Unit {
    let mut b = UnitBuilder::new("add1");
    let x = b.param();
    let sum = b.addi(x, 1);
    b.ret(sum);
    b.finish()
}

/// Iterative factorial of its single argument, with the counter and the
/// accumulator kept in stack variables.
pub fn sample_fact() -> Unit {
    let mut b = UnitBuilder::new("fact");
    let n = b.param();
    let i = b.var("i");
    let acc = b.var("acc");

    let test = b.block();
    let body = b.block();
    let done = b.block();

    let one = b.const_(1);
    b.store(acc, one);
    b.store(i, one);
    b.jump(test);

    b.select_block(test);
    let iv = b.load(i);
    let past = b.cmp(CmpKind::Gt, iv, n);
    b.cond(past, done, body);

    b.select_block(body);
    b.comment("acc := acc * i; i := i + 1");
    let accv = b.load(acc);
    let iv2 = b.load(i);
    let prod = b.mul(accv, iv2);
    b.store(acc, prod);
    let next = b.addi(iv2, 1);
    b.store(i, next);
    b.jump(test);

    b.select_block(done);
    let res = b.load(acc);
    b.ret(res);
    b.finish()
}

/// `max(a, b)` through a conditional branch.
pub fn sample_max() -> Unit {
    let mut b = UnitBuilder::new("max");
    let x = b.param();
    let y = b.param();
    let take_x = b.block();
    let take_y = b.block();

    let gt = b.cmp(CmpKind::Gt, x, y);
    b.cond(gt, take_x, take_y);

    b.select_block(take_x);
    b.ret(x);

    b.select_block(take_y);
    b.ret(y);
    b.finish()
}

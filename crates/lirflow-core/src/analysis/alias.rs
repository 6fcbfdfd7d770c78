use crate::{
    function::Function,
    instructions::{CallKind, Instruction, Operation, ProgramPoint},
    program::Program,
    types::{FunctionType, StructDef, Type},
    values::{PointsTo, Variable},
};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, trace};

/// Types reachable from a root through struct fields and pointees.
///
/// Function types are never part of a closure. Results are memoized per root
/// and the traversal keeps a visited set, so self-referential structs are fine.
pub struct TypeReachability<'p> {
    structs: &'p IndexMap<String, StructDef>,
    cache: HashMap<Type, BTreeSet<Type>>,
}

impl<'p> TypeReachability<'p> {
    pub fn new(structs: &'p IndexMap<String, StructDef>) -> Self {
        Self {
            structs,
            cache: HashMap::new(),
        }
    }

    pub fn reachable(&mut self, root: &Type) -> &BTreeSet<Type> {
        if !self.cache.contains_key(root) {
            let closure = self.compute(root);
            self.cache.insert(root.clone(), closure);
        }
        &self.cache[root]
    }

    fn compute(&self, root: &Type) -> BTreeSet<Type> {
        let mut visited = BTreeSet::new();
        let mut worklist = vec![root.clone()];

        while let Some(ty) = worklist.pop() {
            if ty.is_function_like() || !visited.insert(ty.clone()) {
                continue;
            }
            match &ty {
                Type::Pointer(inner) => worklist.push((**inner).clone()),
                Type::Struct(name) => {
                    if let Some(def) = self.structs.get(name) {
                        worklist.extend(def.field_types().cloned());
                    }
                }
                Type::Int | Type::Function(_) => {}
            }
        }

        visited
    }
}

/// Flow-insensitive, type-partitioned view of memory for one function.
///
/// `AddressTaken[T]` holds every named variable whose address is taken with
/// `$addrof` and every fake heap cell of type `T`. A pointer of type `&T` may
/// point at any member of that set.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    address_taken: BTreeMap<Type, BTreeSet<String>>,
    fake_cells: BTreeMap<Type, String>,
    call_clobbers: BTreeMap<ProgramPoint, BTreeSet<String>>,
}

impl AliasTable {
    /// Builds the table and registers fake heap cells and points-to targets
    /// in `variables`.
    pub fn build(
        program: &Program,
        function: &Function,
        variables: &mut IndexMap<String, Variable>,
    ) -> Self {
        let mut table = Self::default();
        let mut reach = TypeReachability::new(&program.structs);

        let mut roots: BTreeSet<Type> = BTreeSet::new();
        for callee in program.functions.values() {
            roots.extend(
                callee
                    .params
                    .iter()
                    .filter_map(|p| p.param_type.pointee().cloned()),
            );
        }
        roots.extend(program.globals.values().filter_map(|ty| ty.pointee().cloned()));
        for inst in instructions(function) {
            if let Instruction::NonTerminal {
                op: Operation::Alloc { dst, .. },
                ..
            } = inst
            {
                if let Some(pointee) = variables.get(dst).and_then(|v| v.ty.pointee()) {
                    roots.insert(pointee.clone());
                }
            }
        }

        for root in &roots {
            for ty in reach.reachable(root).clone() {
                table.add_fake_cell(ty, variables);
            }
        }

        for inst in instructions(function) {
            let Instruction::NonTerminal { op, .. } = inst else {
                continue;
            };
            match op {
                Operation::AddrOf { dst, src } => {
                    let Some(ty) = variables.get(src).map(|v| v.ty.clone()) else {
                        continue;
                    };
                    table
                        .address_taken
                        .entry(ty)
                        .or_default()
                        .insert(src.clone());
                    if let Some(var) = variables.get_mut(dst) {
                        var.points_to = Some(PointsTo::Variable(src.clone()));
                    }
                }
                Operation::Alloc { dst, .. } => {
                    let cell = variables
                        .get(dst)
                        .and_then(|v| v.ty.pointee())
                        .and_then(|ty| table.fake_cells.get(ty))
                        .cloned();
                    if let (Some(cell), Some(var)) = (cell, variables.get_mut(dst)) {
                        var.points_to = Some(PointsTo::FakeCell(cell));
                    }
                }
                _ => {}
            }
        }

        let global_pointees: Vec<Type> = program
            .globals
            .values()
            .filter_map(|ty| ty.pointee().cloned())
            .collect();

        for inst in instructions(function) {
            let Some(call) = inst.as_call() else {
                continue;
            };

            let signature = match call.kind {
                CallKind::Direct => program.get_function(&call.callee).map(Function::signature),
                CallKind::External => program.externs.get(&call.callee).cloned(),
                CallKind::Indirect => variables
                    .get(&call.callee)
                    .and_then(|v| v.ty.as_function())
                    .cloned(),
            }
            .or_else(|| program.signature(&call.callee));

            let mut clobbered = BTreeSet::new();
            let mut exposed: BTreeSet<Type> = BTreeSet::new();
            for pointee in signature
                .iter()
                .flat_map(FunctionType::pointer_params)
                .chain(global_pointees.iter())
            {
                exposed.extend(reach.reachable(pointee).iter().cloned());
            }
            for ty in &exposed {
                if let Some(members) = table.address_taken.get(ty) {
                    clobbered.extend(members.iter().cloned());
                }
            }
            clobbered.extend(
                program
                    .globals
                    .keys()
                    .filter(|name| **name != call.callee)
                    .cloned(),
            );

            trace!(
                point = %inst.point(),
                callee = %call.callee,
                clobbered = clobbered.len(),
                "call clobber set"
            );
            table.call_clobbers.insert(inst.point(), clobbered);
        }

        debug!(
            function = %function.name,
            types = table.address_taken.len(),
            fake_cells = table.fake_cells.len(),
            calls = table.call_clobbers.len(),
            "alias table built"
        );

        table
    }

    fn add_fake_cell(&mut self, ty: Type, variables: &mut IndexMap<String, Variable>) {
        if self.fake_cells.contains_key(&ty) {
            return;
        }
        let cell = Variable::fake_heap(ty.clone());
        self.address_taken
            .entry(ty.clone())
            .or_default()
            .insert(cell.name.clone());
        self.fake_cells.insert(ty, cell.name.clone());
        variables.entry(cell.name.clone()).or_insert(cell);
    }

    /// Everything a pointer to `ty` may point at.
    pub fn members(&self, ty: &Type) -> impl Iterator<Item = &str> {
        self.address_taken
            .get(ty)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn fake_cell(&self, ty: &Type) -> Option<&str> {
        self.fake_cells.get(ty).map(String::as_str)
    }

    pub fn call_clobbers(&self, point: &ProgramPoint) -> impl Iterator<Item = &str> {
        self.call_clobbers
            .get(point)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn is_address_taken(&self, name: &str) -> bool {
        self.address_taken.values().any(|set| set.contains(name))
    }

    pub fn address_taken(&self) -> &BTreeMap<Type, BTreeSet<String>> {
        &self.address_taken
    }
}

fn instructions(function: &Function) -> impl Iterator<Item = &Instruction> {
    function
        .blocks
        .values()
        .flat_map(|block| block.instructions.iter())
}

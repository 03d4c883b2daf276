// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::cluster::CallableCluster;
use crate::error::CoreError;
use crate::statement::Statement;
use crate::testcase::TestCase;
use crate::types::{CallableDescriptor, CallableKind, TypeInfo};
use crate::varref::StatementIndex;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use testforge_bytecode::Module;
use testforge_trace::{ExecutionTrace, Invocation, InvocationArg, NativeRegistry, Step, Tracer, TracerConfig};

/// Lowers a test case's statement arena into the sequential invocation list
/// the tracer runs (spec.md §4.2, §4.3): calls become [`Step::Call`], pure
/// data-manipulation statements become [`Step::Identity`]/[`Step::List`].
/// Keeping this lowering in `testforge-core` is what lets `testforge-trace`
/// stay ignorant of [`Statement`] (spec.md component table: Tracer sits
/// below Type/Callable Cluster and the GA, not above them).
pub struct Evaluator<'a> {
    cluster: &'a CallableCluster,
    module: Arc<Module>,
    natives: Arc<NativeRegistry>,
    tracer: Tracer,
}

impl<'a> Evaluator<'a> {
    pub fn new(cluster: &'a CallableCluster, module: Arc<Module>, natives: Arc<NativeRegistry>, config: TracerConfig) -> Self {
        Self { cluster, module, natives, tracer: Tracer::new(config) }
    }

    /// Runs `test` to completion (or until a deadline fires) and returns the
    /// resulting execution trace.
    pub fn run(&self, test: &TestCase) -> Result<ExecutionTrace, CoreError> {
        let invocations = self.lower(test)?;
        Ok(self.tracer.run(self.module.clone(), self.natives.clone(), HashMap::new(), invocations))
    }

    fn lower(&self, test: &TestCase) -> Result<Vec<Invocation>, CoreError> {
        let mut out = Vec::with_capacity(test.len());
        for (i, statement) in test.statements().iter().enumerate() {
            let slot = i as u32;
            let step = match statement {
                Statement::PrimitiveLiteral { value, .. } => Step::Identity(InvocationArg::Known(value.clone())),
                Statement::CollectionLiteral { items, .. } => {
                    Step::List(items.iter().map(|&s| InvocationArg::FromSlot(s)).collect())
                }
                Statement::ConstructorCall { callable, args, kwargs, .. }
                | Statement::FunctionCall { callable, args, kwargs, .. } => {
                    let descriptor = self.cluster.get(callable).ok_or(CoreError::NoMatchingCallable)?;
                    let resolved = call_args(args, kwargs, &descriptor.params)?;
                    Step::Call { code_object: descriptor.code_object, args: resolved }
                }
                Statement::MethodCall { receiver, callable, args, kwargs, .. } => {
                    let descriptor = self.cluster.get(callable).ok_or(CoreError::NoMatchingCallable)?;
                    let rest = if descriptor.params.is_empty() { &[][..] } else { &descriptor.params[1..] };
                    let mut resolved = vec![InvocationArg::FromSlot(*receiver)];
                    resolved.extend(call_args(args, kwargs, rest)?);
                    Step::Call { code_object: descriptor.code_object, args: resolved }
                }
                Statement::FieldRead { receiver, field, .. } => {
                    let descriptor = self.field_accessor(field, CallableKind::FieldRead)?;
                    Step::Call { code_object: descriptor.code_object, args: vec![InvocationArg::FromSlot(*receiver)] }
                }
                Statement::FieldWrite { receiver, field, value } => {
                    let descriptor = self.field_accessor(field, CallableKind::FieldWrite)?;
                    Step::Call {
                        code_object: descriptor.code_object,
                        args: vec![InvocationArg::FromSlot(*receiver), InvocationArg::FromSlot(*value)],
                    }
                }
                Statement::Assignment { source, .. } => Step::Identity(InvocationArg::FromSlot(*source)),
            };
            out.push(Invocation { slot, step });
        }
        Ok(out)
    }

    /// Finds the accessor callable for `field` (spec.md §3: field read/write
    /// are modeled as single-parameter/two-parameter callables, not a
    /// separate attribute-access primitive), matched by the accessor's
    /// unqualified name segment.
    fn field_accessor(&self, field: &str, kind: CallableKind) -> Result<&CallableDescriptor, CoreError> {
        self.cluster
            .iter()
            .find(|c| c.kind == kind && c.qualified_name.rsplit('.').next() == Some(field))
            .ok_or(CoreError::NoMatchingCallable)
    }
}

fn call_args(
    args: &[StatementIndex],
    kwargs: &IndexMap<String, StatementIndex>,
    params: &[(String, TypeInfo)],
) -> Result<Vec<InvocationArg>, CoreError> {
    let mut resolved: Vec<Option<StatementIndex>> = args.iter().map(|&a| Some(a)).collect();
    if resolved.len() < params.len() {
        resolved.resize(params.len(), None);
    }
    for (name, &slot) in kwargs {
        if let Some(pos) = params.iter().position(|(p, _)| p == name) {
            resolved[pos] = Some(slot);
        }
    }
    resolved.into_iter().map(|o| o.map(InvocationArg::FromSlot).ok_or(CoreError::NoMatchingCallable)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Visibility;
    use testforge_bytecode::{CodeObjectBuilder, Value};

    #[test]
    fn lowers_literal_and_call_in_order() {
        let mut module_builder = testforge_bytecode::Module::new("pkg");
        let mut builder = CodeObjectBuilder::new(0, "pkg.identity", 1);
        builder.locals(1);
        builder.load_arg(0);
        builder.ret();
        module_builder.insert(builder.build());

        let mut cluster = CallableCluster::new();
        cluster.register(CallableDescriptor {
            qualified_name: "pkg.identity".into(),
            kind: CallableKind::Function,
            params: vec![("x".into(), TypeInfo::concrete("int"))],
            return_type: TypeInfo::concrete("int"),
            owning_type: None,
            visibility: Visibility::Public,
            code_object: 0,
        });

        let mut test = TestCase::new(10);
        test.push(Statement::PrimitiveLiteral {
            value: Value::Int(41),
            produces: crate::varref::VariableReference::new(0, TypeInfo::concrete("int")),
        })
        .unwrap();
        test.push(Statement::FunctionCall {
            callable: "pkg.identity".into(),
            args: smallvec::smallvec![0],
            kwargs: IndexMap::new(),
            produces: crate::varref::VariableReference::new(1, TypeInfo::concrete("int")),
        })
        .unwrap();

        let evaluator = Evaluator::new(
            &cluster,
            Arc::new(module_builder),
            Arc::new(NativeRegistry::new()),
            TracerConfig::default(),
        );
        let trace = evaluator.run(&test).unwrap();
        assert_eq!(trace.statements.len(), 2);
        assert_eq!(trace.statements[1].result, Ok(Value::Int(41)));
    }
}

//! Integration tests for the specification loader

use facetry_core::prelude::*;
use facetry_core::{
    DeploymentError, DomainDescription, FacetValue, FactoryMarker, IntrospectionFailureKind,
    IntrospectionMode, MetaModelValidator, MetamodelError, ValidationReport,
};
use facetry_types::ActionSemantics;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

fn ty(s: &str) -> TypeRef {
    s.parse().unwrap()
}

fn lt(s: &str) -> LogicalType {
    LogicalType::new(s)
}

fn builtin_loader(registry: DescriptorRegistry) -> SpecificationLoader {
    SpecificationLoader::with_builtins(Arc::new(registry), MetamodelConfig::default())
}

fn loader_with(builder: ProgrammingModelBuilder, registry: DescriptorRegistry, config: MetamodelConfig) -> SpecificationLoader {
    let model = builder.build(&config.programming_model);
    SpecificationLoader::new(Arc::new(model), Arc::new(registry), config)
}

/// Counts object-level factory runs per type
#[derive(Clone, Default)]
struct CountingFactory {
    runs: Arc<Mutex<HashMap<String, usize>>>,
}

impl CountingFactory {
    fn runs_for(&self, name: &str) -> usize {
        self.runs.lock().get(name).copied().unwrap_or(0)
    }
}

impl FacetFactory for CountingFactory {
    fn id(&self) -> &'static str {
        "counting"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Object]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::HIDDEN]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let name = ctx.identifier().logical_type.to_string();
        *self.runs.lock().entry(name).or_insert(0) += 1;
        Ok(())
    }
}

fn node_registry() -> DescriptorRegistry {
    DescriptorRegistry::new().with(
        TypeDescriptor::new("Node")
            .method(MethodDescriptor::getter("parent", ty("Node")))
            .method(MethodDescriptor::getter("children", ty("list:Node"))),
    )
}

#[test]
fn test_self_referential_type() {
    let loader = builtin_loader(node_registry());
    let node = loader.load_specification(&lt("Node")).unwrap();

    assert_eq!(node.state(), IntrospectionState::FullyIntrospected);
    assert_eq!(node.members().len(), 2);
    for member in node.members() {
        let element = member.element_spec().unwrap();
        assert!(Arc::ptr_eq(&element, &node), "{} does not point at Node", member.id());
    }
    assert!(node.member("parent").unwrap().is_property());
    assert!(node.member("children").unwrap().is_collection());
    assert!(loader.validation_report().is_empty());
}

#[test]
fn test_mutually_referential_types() {
    let registry = DescriptorRegistry::new()
        .with(TypeDescriptor::new("Order").method(MethodDescriptor::getter("customer", ty("Customer"))))
        .with(TypeDescriptor::new("Customer").method(MethodDescriptor::getter("orders", ty("list:Order"))));
    let loader = builtin_loader(registry);

    let order = loader.load_specification(&lt("Order")).unwrap();
    let customer = loader.load_specification(&lt("Customer")).unwrap();

    assert!(order.is_fully_introspected());
    assert!(customer.is_fully_introspected());
    let back = customer.member("orders").unwrap().element_spec().unwrap();
    assert!(Arc::ptr_eq(&back, &order));
    let forward = order.member("customer").unwrap().element_spec().unwrap();
    assert!(Arc::ptr_eq(&forward, &customer));
}

#[test]
fn test_supertype_cycle_terminates() {
    let registry = DescriptorRegistry::new()
        .with(TypeDescriptor::new("A").extends("B"))
        .with(TypeDescriptor::new("B").extends("A"));
    let loader = builtin_loader(registry);

    let a = loader.load_specification(&lt("A")).unwrap();
    assert!(a.is_fully_introspected());
    let ancestors: Vec<_> = a.ancestors().iter().map(|s| s.logical_type().to_string()).collect();
    assert_eq!(ancestors, vec!["B"]);
}

#[test]
fn test_shared_supertype_resolves_once() {
    let registry = DescriptorRegistry::new()
        .with(
            TypeDescriptor::new("Auditable")
                .kind(TypeKind::Interface)
                .marker(Marker::DescribedAs("Tracks changes".into())),
        )
        .with(TypeDescriptor::new("Party").implements("Auditable"))
        .with(
            TypeDescriptor::new("Customer")
                .extends("Party")
                .implements("Auditable")
                .implements("Auditable"),
        );
    let loader = builtin_loader(registry);

    let customer = loader.load_specification(&lt("Customer")).unwrap();
    assert_eq!(customer.supertypes().len(), 2);
    let via_party = customer.superclass().unwrap().interfaces().remove(0);
    let direct = customer.interfaces().remove(0);
    assert!(Arc::ptr_eq(&via_party, &direct));

    // inherited as a default, from the nearest declaring ancestor
    let described = customer.get_facet(FacetType::DESCRIBED_AS).unwrap();
    assert_eq!(described.as_text(), Some("Tracks changes"));
    assert_eq!(described.holder(), Some(direct.identifier()));
    assert!(!direct.is_instantiable());
    assert!(customer.is_instantiable());
}

#[test]
fn test_local_facet_never_overridden_by_supertype() {
    let registry = DescriptorRegistry::new()
        .with(TypeDescriptor::new("Party").marker(Marker::Named("Legal Party".into())))
        .with(TypeDescriptor::new("Customer").extends("Party"));
    let loader = builtin_loader(registry);

    let customer = loader.load_specification(&lt("Customer")).unwrap();
    // the local fallback name wins over the supertype's explicit one
    let named = customer.get_facet(FacetType::NAMED).unwrap();
    assert_eq!(named.as_text(), Some("Customer"));
    assert_eq!(named.precedence(), Precedence::Fallback);
}

#[test]
fn test_repeated_loads_run_object_factories_once() {
    let counter = CountingFactory::default();
    let mut builder = ProgrammingModelBuilder::with_builtins();
    builder
        .add_factory(ProcessingPhase::StructuralDefaults, counter.clone())
        .unwrap();
    let loader = loader_with(builder, node_registry(), MetamodelConfig::default());

    let first = loader.load_specification(&lt("Node")).unwrap();
    let second = loader.load_specification(&lt("Node")).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(counter.runs_for("Node"), 1);
}

#[test]
fn test_concurrent_first_use() {
    let counter = CountingFactory::default();
    let mut builder = ProgrammingModelBuilder::with_builtins();
    builder
        .add_factory(ProcessingPhase::StructuralDefaults, counter.clone())
        .unwrap();
    let registry = node_registry()
        .with(
            TypeDescriptor::new("Customer")
                .method(MethodDescriptor::getter("name", ty("string")))
                .method(MethodDescriptor::getter("orders", ty("list:Order"))),
        )
        .with(TypeDescriptor::new("Order").method(MethodDescriptor::getter("customer", ty("Customer"))));
    let loader = loader_with(builder, registry, MetamodelConfig::default());

    let names = ["Node", "Customer", "Order"];
    let results: Vec<Vec<Arc<ObjectSpecification>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let loader = &loader;
                scope.spawn(move || {
                    names
                        .iter()
                        .cycle()
                        .skip(i % names.len())
                        .take(names.len())
                        .map(|name| loader.load_specification(&lt(name)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for name in names {
        let canonical = loader.lookup(&lt(name)).unwrap();
        assert!(canonical.is_fully_introspected());
        for specs in &results {
            let seen = specs.iter().find(|s| s.logical_type().as_str() == name).unwrap();
            assert!(Arc::ptr_eq(seen, &canonical));
        }
        assert_eq!(counter.runs_for(name), 1, "{} introspected more than once", name);
    }
}

/// Mandatory for every property not explicitly marked optional
struct MandatoryUnlessOptional;

impl FacetFactory for MandatoryUnlessOptional {
    fn id(&self) -> &'static str {
        "mandatory-unless-optional"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Property]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::MANDATORY]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        if !ctx.feature().has_marker("optional") {
            ctx.add_facet(Facet::mandatory(true, Precedence::Default))?;
        }
        Ok(())
    }
}

/// Every property is mandatory, explicitly
struct AlwaysMandatory;

impl FacetFactory for AlwaysMandatory {
    fn id(&self) -> &'static str {
        "always-mandatory"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Property]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::MANDATORY]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        ctx.add_facet(Facet::mandatory(true, Precedence::Default))?;
        Ok(())
    }
}

fn customer_with_optional_age() -> DescriptorRegistry {
    DescriptorRegistry::new().with(
        TypeDescriptor::new("Customer")
            .method(MethodDescriptor::getter("age", ty("boxed:int")).marker(Marker::Optional))
            .method(MethodDescriptor::getter("name", ty("string"))),
    )
}

#[test]
fn test_optional_wrapper_wins_over_annotation_default() {
    let mut builder = ProgrammingModelBuilder::new();
    builder
        .add_factory(ProcessingPhase::AnnotationDriven, MandatoryUnlessOptional)
        .unwrap()
        .add_factory(
            ProcessingPhase::ConventionDerived,
            facetry_core::factories::conventions::OptionalWrapperFactory,
        )
        .unwrap();
    let loader = loader_with(builder, customer_with_optional_age(), MetamodelConfig::default());

    let customer = loader.load_specification(&lt("Customer")).unwrap();
    let age = customer.member("age").unwrap();
    assert!(!age.is_mandatory());
    assert_eq!(age.get_facet(FacetType::MANDATORY).unwrap().precedence(), Precedence::High);
    assert!(customer.member("name").unwrap().is_mandatory());
}

#[test]
fn test_high_precedence_overrides_explicit_default() {
    let mut builder = ProgrammingModelBuilder::with_builtins();
    builder
        .add_factory(ProcessingPhase::AnnotationDriven, AlwaysMandatory)
        .unwrap();
    let loader = loader_with(builder, customer_with_optional_age(), MetamodelConfig::default());

    let customer = loader.load_specification(&lt("Customer")).unwrap();
    let mandatory = customer.member("age").unwrap().get_facet(FacetType::MANDATORY).unwrap();
    assert_eq!(mandatory.as_flag(), Some(false));
    assert_eq!(mandatory.contributed_by(), Some("optional-wrapper"));
}

#[test]
fn test_builtin_model_end_to_end() {
    let registry = DescriptorRegistry::new().with(
        TypeDescriptor::new("Order")
            .marker(Marker::Immutable(None))
            .method(
                MethodDescriptor::getter("notes", ty("string"))
                    .marker(Marker::MaxLength(200))
                    .marker(Marker::Optional),
            )
            .method(
                MethodDescriptor::getter("number", ty("prim:long")).marker(Marker::MemberOrder {
                    sequence: "1".into(),
                    group: None,
                }),
            )
            .method(MethodDescriptor::getter("lines", ty("list:string")))
            .method(MethodDescriptor::new("findSimilar").returns(ty("list:Order")))
            .method(
                MethodDescriptor::new("ship")
                    .marker(Marker::ActionSemantics(ActionSemantics::Idempotent))
                    .param(ParameterDescriptor::new("carrier", ty("string"))),
            )
            .method(MethodDescriptor::new("choices0Ship").returns(ty("list:string")))
            .method(MethodDescriptor::new("cancel"))
            .method(MethodDescriptor::new("title").returns(ty("string"))),
    );
    let loader = builtin_loader(registry);
    let order = loader.load_specification(&lt("Order")).unwrap();

    let ids: Vec<_> = order.members().iter().map(|m| m.id()).collect();
    assert_eq!(ids, vec!["number", "notes", "lines", "findSimilar", "ship", "cancel"]);

    assert!(order.contains_facet(FacetType::TITLE));
    assert_eq!(order.member("number").unwrap().name(), "Number");
    assert!(order.member("number").unwrap().is_mandatory());
    assert!(!order.member("notes").unwrap().is_mandatory());
    assert!(!order.member("lines").unwrap().is_mandatory());

    // immutable object: associations disabled, actions untouched
    assert!(order.member("notes").unwrap().is_disabled());
    assert!(order.member("lines").unwrap().is_disabled());
    assert!(!order.member("cancel").unwrap().is_disabled());

    assert_eq!(
        order.member("findSimilar").unwrap().action_semantics(),
        Some(ActionSemantics::Safe)
    );
    assert_eq!(
        order.member("ship").unwrap().action_semantics(),
        Some(ActionSemantics::Idempotent)
    );
    assert_eq!(
        order.member("cancel").unwrap().action_semantics(),
        Some(ActionSemantics::NonIdempotent)
    );

    let carrier = &order.member("ship").unwrap().parameters()[0];
    assert_eq!(carrier.name(), "carrier");
    assert!(carrier.is_mandatory());
    assert_eq!(
        carrier.get_facet(FacetType::CHOICES).unwrap().value(),
        &FacetValue::Method("choices0Ship".into())
    );
    assert_eq!(carrier.spec().unwrap().logical_type().as_str(), "string");

    assert!(loader.validation_report().is_empty());
    assert!(!order.is_rejected());
}

/// Fails on every property named `broken`
struct Fussy;

impl FacetFactory for Fussy {
    fn id(&self) -> &'static str {
        "fussy"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Property]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::HIDDEN]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        // installed before failing: must not survive
        ctx.add_facet(Facet::hidden(Precedence::Event))?;
        if ctx.feature().name() == "broken" {
            return Err(FactoryError::failed("cannot handle broken"));
        }
        Ok(())
    }
}

/// Panics on every action
struct Explosive;

impl FacetFactory for Explosive {
    fn id(&self) -> &'static str {
        "explosive"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Action]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::HIDDEN]
    }

    fn process(&self, _ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        panic!("kaboom");
    }
}

fn fragile_registry() -> DescriptorRegistry {
    DescriptorRegistry::new().with(
        TypeDescriptor::new("Widget")
            .method(MethodDescriptor::getter("broken", ty("string")))
            .method(MethodDescriptor::getter("fine", ty("string")))
            .method(MethodDescriptor::new("spin")),
    )
}

#[test]
fn test_factory_failures_are_recorded_not_thrown() {
    let mut builder = ProgrammingModelBuilder::with_builtins();
    builder
        .add_factory(ProcessingPhase::AnnotationDriven, Fussy)
        .unwrap()
        .add_factory(ProcessingPhase::AnnotationDriven, Explosive)
        .unwrap();
    let loader = loader_with(builder, fragile_registry(), MetamodelConfig::default());

    let widget = loader.load_specification(&lt("Widget")).unwrap();
    assert!(widget.is_fully_introspected());

    let broken = widget.member("broken").unwrap();
    assert!(!broken.is_hidden(), "failed factory left a facet behind");
    // later phases still ran
    assert!(broken.is_mandatory());
    assert!(widget.member("fine").unwrap().is_hidden());
    assert_eq!(
        widget.member("spin").unwrap().action_semantics(),
        Some(ActionSemantics::NonIdempotent)
    );

    let report = loader.validation_report();
    let failures = report.introspection_failures();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|f| f.kind == IntrospectionFailureKind::Factory));
    assert!(failures
        .iter()
        .any(|f| f.source == "fussy" && f.identifier.to_string() == "Widget#broken"));
    assert!(failures
        .iter()
        .any(|f| f.source == "explosive" && f.message.contains("kaboom")));
    assert_eq!(loader.metrics().factory_failures, 2);

    let err = loader.bootstrap().unwrap_err();
    assert!(matches!(err, DeploymentError::Invalid { count: 2, .. }));
}

#[test]
fn test_fail_fast_aborts_loading() {
    let mut builder = ProgrammingModelBuilder::with_builtins();
    builder.add_factory(ProcessingPhase::AnnotationDriven, Fussy).unwrap();
    let mut config = MetamodelConfig::default();
    config.introspection.fail_fast = true;
    let loader = loader_with(builder, fragile_registry(), config);

    let err = loader.load_specification(&lt("Widget")).unwrap_err();
    match err {
        MetamodelError::FactoryFailed {
            identifier,
            factory,
            ..
        } => {
            assert_eq!(identifier.to_string(), "Widget#broken");
            assert_eq!(factory, "fussy");
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(loader.lookup(&lt("Widget")).is_none());
}

#[test]
fn test_validation_failures_reject_but_keep_loading() {
    let registry = DescriptorRegistry::new()
        .with(
            TypeDescriptor::new("Invoice")
                .method(MethodDescriptor::getter("total", ty("prim:int")).marker(Marker::Optional))
                .method(MethodDescriptor::getter("count", ty("prim:int")).marker(Marker::MaxLength(3)))
                .method(MethodDescriptor::getter("owner", ty("Ghost"))),
        )
        .with(TypeDescriptor::new("Customer").method(MethodDescriptor::getter("name", ty("string"))));
    let mut config = MetamodelConfig::default();
    config.introspection.mode = IntrospectionMode::Eager;
    let loader = SpecificationLoader::with_builtins(Arc::new(registry), config);

    let err = loader.bootstrap().unwrap_err();
    let report = err.report().unwrap();
    let validators: Vec<_> = report.failures().iter().map(|f| f.validator).collect();
    assert!(validators.contains(&"optional-primitive"));
    assert!(validators.contains(&"max-length-type"));
    assert_eq!(report.introspection_failures().len(), 1);
    assert_eq!(
        report.introspection_failures()[0].kind,
        IntrospectionFailureKind::UnresolvedType
    );
    assert!(err.to_string().contains("Invoice#total"));

    let invoice = loader.lookup(&lt("Invoice")).unwrap();
    assert!(invoice.is_rejected());
    assert!(invoice.member("owner").unwrap().element_spec().is_none());
    let customer = loader.lookup(&lt("Customer")).unwrap();
    assert!(customer.is_fully_introspected());
    assert!(!customer.is_rejected());
}

/// Rejects every type and remembers the state each one was validated in
#[derive(Clone, Default)]
struct RejectAll {
    seen: Arc<Mutex<Vec<IntrospectionState>>>,
}

impl MetaModelValidator for RejectAll {
    fn id(&self) -> &'static str {
        "reject-all"
    }

    fn validate(&self, spec: &ObjectSpecification, report: &mut ValidationReport) {
        self.seen.lock().push(spec.state());
        report.add_failure(spec.identifier(), "reject-all", "rejected");
    }
}

#[test]
fn test_rejection_settled_before_fully_introspected() {
    let validator = RejectAll::default();
    let mut builder = ProgrammingModelBuilder::with_builtins();
    builder.add_validator(validator.clone()).unwrap();
    let loader = loader_with(builder, node_registry(), MetamodelConfig::default());

    let node = loader.load_specification(&lt("Node")).unwrap();

    assert_eq!(*validator.seen.lock(), vec![IntrospectionState::TypeIntrospected]);
    assert!(node.is_fully_introspected());
    assert!(node.is_rejected());
    let cached = loader.lookup(&lt("Node")).unwrap();
    assert!(Arc::ptr_eq(&cached, &node));
    assert_eq!(loader.validation_report().failures_for(node.identifier()).count(), 1);
}

#[test]
fn test_eager_bootstrap_summary() {
    let mut config = MetamodelConfig::default();
    config.introspection.mode = IntrospectionMode::Eager;
    let loader = SpecificationLoader::with_builtins(Arc::new(node_registry()), config);

    let summary = loader.bootstrap().unwrap();
    // the built-in value types are specifications too
    assert_eq!(summary.specifications, loader.descriptors().known_types().len());
    assert_eq!(summary.members, 2);
}

#[test]
fn test_lazy_bootstrap_loads_nothing() {
    let loader = builtin_loader(node_registry());
    let summary = loader.bootstrap().unwrap();
    assert_eq!(summary.specifications, 0);
    assert!(loader.is_empty());
}

#[test]
fn test_deprecated_extension_filtered_by_config() {
    let counter = CountingFactory::default();
    let mut builder = ProgrammingModelBuilder::with_builtins();
    builder
        .add_factory_with_marker(
            ProcessingPhase::StructuralDefaults,
            FactoryMarker::Deprecated,
            counter.clone(),
        )
        .unwrap();
    let loader = loader_with(builder, node_registry(), MetamodelConfig::default());
    loader.load_specification(&lt("Node")).unwrap();
    assert_eq!(counter.runs_for("Node"), 0);
}

#[test]
fn test_domain_description_from_yaml() {
    let yaml = r#"
types:
  - name: Customer
    markers:
      - marker: named
        value: Client
    methods:
      - name: getName
        returns: string
        markers:
          - marker: max_length
            value: 40
      - name: getOrders
        returns: list:Order
  - name: Order
    methods:
      - name: getCustomer
        returns: Customer
"#;
    let description = DomainDescription::from_yaml_str(yaml).unwrap();
    let registry = DescriptorRegistry::from_description(description).unwrap();
    let loader = builtin_loader(registry);

    let customer = loader.load_specification(&lt("Customer")).unwrap();
    assert_eq!(customer.name(), "Client");
    assert_eq!(customer.members().len(), 2);
    let orders = customer.member("orders").unwrap();
    assert!(orders.is_collection());
    assert_eq!(orders.element_spec().unwrap().logical_type().as_str(), "Order");
    assert!(loader.validation_report().is_empty());
}

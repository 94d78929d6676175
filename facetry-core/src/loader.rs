//! The specification loader
//!
//! Builds one [`ObjectSpecification`] per logical type and caches it for
//! the lifetime of the loader. Loading proceeds through
//! `NotIntrospected -> TypeIntrospected -> FullyIntrospected`:
//!
//! 1. A cache hit on a fully introspected specification returns at once.
//! 2. Otherwise a placeholder is inserted into the cache before any factory
//!    runs, so a nested load of the same type (a self-referential member, a
//!    supertype cycle) gets the placeholder instead of recursing.
//! 3. Supertypes are loaded and object-level factories run.
//! 4. Members are discovered and member-level factories run over each.
//! 5. Validators check the result; failures are recorded, never thrown.
//!    Only then is the specification marked fully introspected, so the
//!    lock-free fast path never serves one whose rejection is still pending.
//!
//! Introspection is serialized by one re-entrant lock. Concurrent first use
//! of the same type therefore introspects it exactly once, while a nested
//! load on the introspecting thread can re-enter and see the placeholder.
//! Cache hits on finished specifications never touch the lock.
//!
//! The lock is loader-wide, not per type, so first use of unrelated types
//! on different threads is serialized as well.

use crate::config::MetamodelConfig;
use crate::descriptor::{DescriptorSource, TypeDescriptor};
use crate::discovery::discover_members;
use crate::error::{DeploymentError, MetamodelError, Result};
use crate::factory::{FactoryError, Feature, ProcessContext};
use crate::holder::FacetHolder;
use crate::member::{sort_members, ActionParameter, MemberKind, ObjectMember};
use crate::metrics::{LoaderMetrics, MetricsSnapshot};
use crate::programming_model::{ProgrammingModel, ProgrammingModelBuilder};
use crate::specification::{IntrospectionState, ObjectSpecification};
use crate::validation::{IntrospectionFailure, ValidationReport};
use dashmap::DashMap;
use facetry_types::{FeatureType, Identifier, LogicalType, TypeRef};
use parking_lot::{Mutex, ReentrantMutex};
use serde::Serialize;
use std::any::Any;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, debug_span, info, trace, warn};

/// Outcome of a successful bootstrap
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapSummary {
    pub specifications: usize,
    pub members: usize,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

pub struct SpecificationLoader {
    config: MetamodelConfig,
    programming_model: Arc<ProgrammingModel>,
    descriptors: Arc<dyn DescriptorSource>,
    cache: DashMap<LogicalType, Arc<ObjectSpecification>>,
    introspection_lock: ReentrantMutex<()>,
    report: Mutex<ValidationReport>,
    metrics: LoaderMetrics,
}

impl SpecificationLoader {
    pub fn new(
        programming_model: Arc<ProgrammingModel>,
        descriptors: Arc<dyn DescriptorSource>,
        config: MetamodelConfig,
    ) -> Self {
        Self {
            config,
            programming_model,
            descriptors,
            cache: DashMap::new(),
            introspection_lock: ReentrantMutex::new(()),
            report: Mutex::new(ValidationReport::new()),
            metrics: LoaderMetrics::new(),
        }
    }

    /// A loader over the built-in programming model, filtered by `config`
    pub fn with_builtins(descriptors: Arc<dyn DescriptorSource>, config: MetamodelConfig) -> Self {
        let model = ProgrammingModelBuilder::with_builtins().build(&config.programming_model);
        Self::new(Arc::new(model), descriptors, config)
    }

    pub fn config(&self) -> &MetamodelConfig {
        &self.config
    }

    pub fn programming_model(&self) -> &Arc<ProgrammingModel> {
        &self.programming_model
    }

    pub fn descriptors(&self) -> &Arc<dyn DescriptorSource> {
        &self.descriptors
    }

    /// Get the specification of `logical_type`, introspecting it on first use
    pub fn load_specification(&self, logical_type: &LogicalType) -> Result<Arc<ObjectSpecification>> {
        if let Some(spec) = self.cached(logical_type) {
            if spec.is_fully_introspected() {
                self.metrics.record_hit();
                return Ok(spec);
            }
        }

        let _guard = self.introspection_lock.lock();

        let spec = match self.cached(logical_type) {
            Some(spec) if spec.is_fully_introspected() || spec.is_in_progress() => {
                // finished by another thread, or a nested load on this one
                self.metrics.record_hit();
                trace!(logical_type = %logical_type, state = %spec.state(), "cache hit");
                return Ok(spec);
            }
            Some(spec) => spec,
            None => {
                let descriptor = self
                    .descriptors
                    .describe(logical_type)
                    .ok_or_else(|| MetamodelError::UnknownType(logical_type.clone()))?;
                let spec = Arc::new(ObjectSpecification::new(descriptor));
                self.cache.insert(logical_type.clone(), Arc::clone(&spec));
                spec
            }
        };

        self.metrics.record_miss();
        self.introspect(&spec)?;
        Ok(spec)
    }

    /// The cached specification, without introspecting
    pub fn lookup(&self, logical_type: &LogicalType) -> Option<Arc<ObjectSpecification>> {
        self.cached(logical_type)
    }

    fn cached(&self, logical_type: &LogicalType) -> Option<Arc<ObjectSpecification>> {
        self.cache.get(logical_type).map(|entry| Arc::clone(entry.value()))
    }

    fn introspect(&self, spec: &Arc<ObjectSpecification>) -> Result<()> {
        let span = debug_span!("introspect", logical_type = %spec.logical_type());
        let _enter = span.enter();
        let started = Instant::now();

        spec.set_in_progress(true);
        let result = self
            .introspect_type(spec)
            .and_then(|_| self.introspect_members(spec));
        spec.set_in_progress(false);

        match result {
            Ok(()) => {
                // rejection must be settled before the fast path can serve it
                if self.config.validation.enabled {
                    self.validate(spec);
                }
                spec.set_state(IntrospectionState::FullyIntrospected);
                self.metrics.record_introspection(started.elapsed());
                debug!(
                    members = spec.members().len(),
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "specification introspected"
                );
                Ok(())
            }
            Err(err) => {
                // a half-built placeholder must not be served
                self.cache.remove(spec.logical_type());
                Err(err)
            }
        }
    }

    fn introspect_type(&self, spec: &Arc<ObjectSpecification>) -> Result<()> {
        let descriptor = Arc::clone(spec.descriptor());

        let mut supertypes = Vec::new();
        let mut seen = HashSet::new();
        for supertype in descriptor.supertypes() {
            // declared both as superclass and interface: one specification
            if supertype == spec.logical_type() || !seen.insert(supertype.clone()) {
                continue;
            }
            match self.load_specification(supertype) {
                Ok(resolved) => supertypes.push(Arc::downgrade(&resolved)),
                Err(err) => self.nested_failure(spec.identifier(), err)?,
            }
        }
        spec.set_supertypes(supertypes);

        let mut holder = FacetHolder::new(spec.identifier().clone());
        self.run_factories(FeatureType::Object, Feature::Type(&descriptor), &mut holder, None)?;
        spec.replace_facets(holder);
        spec.set_state(IntrospectionState::TypeIntrospected);
        trace!(facets = spec.local_facets().len(), "type introspected");
        Ok(())
    }

    fn introspect_members(&self, spec: &Arc<ObjectSpecification>) -> Result<()> {
        let owner = self.effective_descriptor(spec.descriptor());
        let owner_facets = spec.effective_facets();

        let mut members = Vec::new();
        for discovered in discover_members(&owner) {
            let identifier = Identifier::for_member(spec.logical_type().clone(), &discovered.id);
            let element_spec = self.resolve_type_ref(&identifier, &discovered.method.returns)?;

            let feature_type = discovered.kind.feature_type();
            let mut holder = FacetHolder::new(identifier.clone());
            let feature = Feature::Member {
                owner: &owner,
                method: discovered.method,
                feature_type,
                member_id: &discovered.id,
            };
            self.run_factories(feature_type, feature, &mut holder, Some(&owner_facets))?;

            let mut parameters = Vec::new();
            if discovered.kind == MemberKind::Action {
                for (index, parameter) in discovered.method.parameters.iter().enumerate() {
                    let parameter_id = identifier.parameter(index);
                    let parameter_spec = self.resolve_type_ref(&parameter_id, &parameter.type_ref)?;
                    let mut parameter_holder = FacetHolder::new(parameter_id);
                    let feature = Feature::Parameter {
                        owner: &owner,
                        action: discovered.method,
                        parameter,
                        index,
                    };
                    self.run_factories(
                        FeatureType::ActionParameter,
                        feature,
                        &mut parameter_holder,
                        Some(&owner_facets),
                    )?;
                    parameters.push(ActionParameter::new(
                        index,
                        parameter.name.clone(),
                        parameter.type_ref.clone(),
                        parameter_holder,
                        parameter_spec,
                    ));
                }
            }

            members.push(Arc::new(ObjectMember::new(
                discovered.kind,
                discovered.id,
                discovered.method.name.clone(),
                discovered.method.returns.clone(),
                holder,
                element_spec,
                parameters,
            )));
        }

        sort_members(&mut members);
        spec.set_members(members);
        Ok(())
    }

    /// Load the specification a member or parameter refers to
    fn resolve_type_ref(
        &self,
        identifier: &Identifier,
        type_ref: &TypeRef,
    ) -> Result<Option<Weak<ObjectSpecification>>> {
        let Some(logical_type) = type_ref.element_type() else {
            return Ok(None);
        };
        match self.load_specification(logical_type) {
            Ok(spec) => Ok(Some(Arc::downgrade(&spec))),
            Err(err) => {
                self.nested_failure(identifier, err)?;
                Ok(None)
            }
        }
    }

    /// Record a failed nested load, or propagate it when failing fast
    fn nested_failure(&self, identifier: &Identifier, err: MetamodelError) -> Result<()> {
        if self.config.introspection.fail_fast {
            return Err(err);
        }
        match err {
            MetamodelError::UnknownType(missing) => {
                warn!(feature = %identifier, missing = %missing, "referenced type has no descriptor");
                self.report
                    .lock()
                    .record_introspection_failure(IntrospectionFailure::unresolved_type(
                        identifier.clone(),
                        missing.as_str(),
                    ));
                Ok(())
            }
            // factory failures are recorded where they happen
            MetamodelError::FactoryFailed { .. } => Ok(()),
        }
    }

    /// Superclass methods the type does not redeclare are members too
    fn effective_descriptor(&self, descriptor: &Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        let mut visited = HashSet::new();
        visited.insert(descriptor.logical_type.clone());
        let mut chain = Vec::new();
        let mut next = descriptor.superclass.clone();
        while let Some(superclass) = next {
            if !visited.insert(superclass.clone()) {
                break;
            }
            match self.descriptors.describe(&superclass) {
                Some(ancestor) => {
                    next = ancestor.superclass.clone();
                    chain.push(ancestor);
                }
                None => break,
            }
        }

        if chain.iter().all(|ancestor| ancestor.methods.is_empty()) {
            return Arc::clone(descriptor);
        }
        let mut merged = TypeDescriptor::clone(descriptor);
        for ancestor in chain {
            for method in &ancestor.methods {
                if merged.find_method(&method.name).is_none() {
                    merged.methods.push(method.clone());
                }
            }
        }
        Arc::new(merged)
    }

    /// Run every factory for `feature_type` in phase order
    ///
    /// Each factory works on a copy of the holder that is committed only if
    /// it succeeds, so a failing factory leaves nothing behind.
    fn run_factories(
        &self,
        feature_type: FeatureType,
        feature: Feature<'_>,
        holder: &mut FacetHolder,
        owner_facets: Option<&FacetHolder>,
    ) -> Result<()> {
        for registered in self.programming_model.factories_for(feature_type) {
            let mut staged = holder.clone();
            let outcome = {
                let factory = registered.factory();
                let mut ctx = ProcessContext::new(factory, feature, &mut staged, owner_facets);
                catch_unwind(AssertUnwindSafe(|| factory.process(&mut ctx)))
                    .unwrap_or_else(|payload| Err(FactoryError::Panicked(panic_message(payload))))
            };

            match outcome {
                Ok(()) => *holder = staged,
                Err(err) => {
                    self.metrics.record_factory_failure();
                    warn!(
                        feature = %holder.identifier(),
                        factory = registered.id(),
                        phase = %registered.phase(),
                        error = %err,
                        "facet factory failed"
                    );
                    if self.config.introspection.fail_fast {
                        return Err(MetamodelError::FactoryFailed {
                            identifier: holder.identifier().clone(),
                            factory: registered.id().to_string(),
                            message: err.to_string(),
                        });
                    }
                    self.report
                        .lock()
                        .record_introspection_failure(IntrospectionFailure::factory(
                            holder.identifier().clone(),
                            registered.id(),
                            err.to_string(),
                        ));
                }
            }
        }
        Ok(())
    }

    fn validate(&self, spec: &Arc<ObjectSpecification>) {
        let mut found = ValidationReport::new();
        for validator in self.programming_model.validators() {
            validator.validate(spec, &mut found);
        }
        if found.is_empty() {
            return;
        }
        for failure in found.failures() {
            warn!(validator = failure.validator, "{}", failure);
        }
        spec.mark_rejected();
        self.report.lock().merge(found);
    }

    /// Introspect every type the descriptor source knows
    pub fn load_all(&self) -> Result<Vec<Arc<ObjectSpecification>>> {
        self.descriptors
            .known_types()
            .iter()
            .map(|logical_type| self.load_specification(logical_type))
            .collect()
    }

    /// Finish metamodel construction
    ///
    /// In eager mode every known type is introspected first. Fails with the
    /// complete report if anything was recorded against the metamodel.
    pub fn bootstrap(&self) -> std::result::Result<BootstrapSummary, DeploymentError> {
        let started = Instant::now();
        if self.config.is_eager() {
            self.load_all()?;
        }

        let report = self.validation_report();
        if !report.is_empty() {
            warn!(problems = report.len(), "metamodel is invalid");
            return Err(DeploymentError::Invalid {
                count: report.len(),
                report,
            });
        }

        let specifications = self.specifications();
        let summary = BootstrapSummary {
            members: specifications.iter().map(|s| s.members().len()).sum(),
            specifications: specifications.len(),
            elapsed: started.elapsed(),
        };
        info!(
            specifications = summary.specifications,
            members = summary.members,
            "metamodel bootstrapped"
        );
        Ok(summary)
    }

    /// Every cached specification, ordered by logical type
    pub fn specifications(&self) -> Vec<Arc<ObjectSpecification>> {
        let mut specs: Vec<_> = self
            .cache
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        specs.sort_by(|a, b| a.logical_type().cmp(b.logical_type()));
        specs
    }

    pub fn validation_report(&self) -> ValidationReport {
        self.report.lock().clone()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop every specification and forget recorded failures
    pub fn reset(&self) {
        let _guard = self.introspection_lock.lock();
        self.cache.clear();
        self.report.lock().clear();
        self.metrics.reset();
        debug!("specification cache reset");
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! Module dependency graph
//!
//! Turns the registered modules into an initialization plan:
//!
//! 1. every provided capability must have exactly one providing module,
//! 2. every consumed capability must be resolvable,
//! 3. module `A` depends on module `B` when `A` consumes something `B`
//!    provides, directly or through the dependency chain of a service factory,
//! 4. the graph must be acyclic; independent modules keep registration order.
//!
//! All of this happens before any module initializer runs.

use crate::holder::DefaultServiceHolder;
use plexus_domain::error::{Error, ProviderConflict, Result};
use plexus_domain::{CapabilityRef, ModuleRegistration};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Validated initialization plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitPlan {
    /// Module indices in a valid initialization order
    pub order: Vec<usize>,
    /// For each module index, the indices of the modules it waits for
    pub dependencies: Vec<BTreeSet<usize>>,
}

impl InitPlan {
    /// Module ids in initialization order
    pub fn ordered_ids<'a>(&self, modules: &'a [ModuleRegistration]) -> Vec<&'a str> {
        self.order.iter().map(|&i| modules[i].id()).collect()
    }
}

/// Validate the modules and compute their initialization plan
pub fn resolve(modules: &[ModuleRegistration], holder: &DefaultServiceHolder) -> Result<InitPlan> {
    let providers = collect_providers(modules)?;
    let mut resolver = EdgeResolver {
        modules,
        holder,
        providers: &providers,
        closures: HashMap::new(),
    };

    let dependencies = modules
        .iter()
        .enumerate()
        .map(|(index, module)| resolver.module_dependencies(index, module))
        .collect::<Result<Vec<_>>>()?;

    let order = topological_order(modules, &dependencies)?;
    Ok(InitPlan {
        order,
        dependencies,
    })
}

/// Map every provided capability to its single providing module
///
/// Exclusivity covers every capability kind: a service listed in two
/// modules' `provides` is rejected just like a shared extension point.
fn collect_providers(modules: &[ModuleRegistration]) -> Result<HashMap<CapabilityRef, usize>> {
    let mut providers: HashMap<CapabilityRef, usize> = HashMap::new();
    let mut conflicts: Vec<ProviderConflict> = Vec::new();

    for (index, module) in modules.iter().enumerate() {
        for capability in module.provides() {
            let Some(&owner) = providers.get(capability) else {
                providers.insert(capability.clone(), index);
                continue;
            };
            match conflicts
                .iter_mut()
                .find(|conflict| conflict.capability == capability.id())
            {
                Some(conflict) => conflict.modules.push(module.id().to_string()),
                None => conflicts.push(ProviderConflict {
                    capability: capability.id().to_string(),
                    modules: vec![modules[owner].id().to_string(), module.id().to_string()],
                }),
            }
        }
    }

    if conflicts.is_empty() {
        Ok(providers)
    } else {
        Err(Error::DuplicateProvider { conflicts })
    }
}

struct EdgeResolver<'a> {
    modules: &'a [ModuleRegistration],
    holder: &'a DefaultServiceHolder,
    providers: &'a HashMap<CapabilityRef, usize>,
    closures: HashMap<CapabilityRef, BTreeSet<CapabilityRef>>,
}

impl EdgeResolver<'_> {
    fn module_dependencies(
        &mut self,
        index: usize,
        module: &ModuleRegistration,
    ) -> Result<BTreeSet<usize>> {
        let named: HashSet<&CapabilityRef> = module.deps().values().collect();
        let mut reached: BTreeSet<CapabilityRef> = BTreeSet::new();

        for capability in module.consumes() {
            self.check_resolvable(capability, named.contains(capability), module.id())?;
            reached.insert(capability.clone());
            if self.holder.contains(capability) {
                reached.extend(self.factory_closure(capability)?);
            }
        }

        Ok(reached
            .iter()
            .filter_map(|capability| self.providers.get(capability).copied())
            .filter(|&provider| provider != index)
            .collect())
    }

    /// A consumed capability must be backed by a factory, an extension point
    /// implementation, or (for plain consumption) a providing module
    fn check_resolvable(
        &self,
        capability: &CapabilityRef,
        named: bool,
        module_id: &str,
    ) -> Result<()> {
        let resolvable = if capability.is_service() {
            self.holder.contains(capability) || (!named && self.providers.contains_key(capability))
        } else {
            match self.providers.get(capability) {
                Some(&owner) => {
                    !named || self.modules[owner].extension_points().contains_key(capability)
                }
                None => false,
            }
        };

        if resolvable {
            Ok(())
        } else {
            Err(Error::unknown_capability(capability.id(), module_id))
        }
    }

    /// Every capability reachable through the factory chain of `service`
    fn factory_closure(&mut self, service: &CapabilityRef) -> Result<BTreeSet<CapabilityRef>> {
        if let Some(cached) = self.closures.get(service) {
            return Ok(cached.clone());
        }
        let mut reached = BTreeSet::new();
        let mut path = Vec::new();
        let mut finished = HashSet::new();
        self.walk_factory(service, &mut path, &mut finished, &mut reached)?;
        self.closures.insert(service.clone(), reached.clone());
        Ok(reached)
    }

    /// Depth-first walk; `finished` holds services whose subtree is already
    /// in `reached`, so shared dependencies are visited once
    fn walk_factory(
        &self,
        service: &CapabilityRef,
        path: &mut Vec<CapabilityRef>,
        finished: &mut HashSet<CapabilityRef>,
        reached: &mut BTreeSet<CapabilityRef>,
    ) -> Result<()> {
        if let Some(start) = path.iter().position(|seen| seen == service) {
            let mut cycle: Vec<String> = path[start..].iter().map(|r| r.id().to_string()).collect();
            cycle.push(service.id().to_string());
            return Err(Error::CyclicDependency { cycle });
        }
        if finished.contains(service) {
            return Ok(());
        }
        let Some(factory) = self.holder.factory(service) else {
            return Ok(());
        };

        path.push(service.clone());
        for dependency in factory.dependency_refs() {
            if !self.holder.contains(&dependency) {
                return Err(Error::unknown_capability(dependency.id(), service.id()));
            }
            reached.insert(dependency.clone());
            self.walk_factory(&dependency, path, finished, reached)?;
        }
        path.pop();
        finished.insert(service.clone());
        Ok(())
    }
}

/// Kahn's algorithm, always picking the earliest registered ready module
fn topological_order(
    modules: &[ModuleRegistration],
    dependencies: &[BTreeSet<usize>],
) -> Result<Vec<usize>> {
    let mut in_degree: Vec<usize> = dependencies.iter().map(BTreeSet::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); modules.len()];
    for (index, deps) in dependencies.iter().enumerate() {
        for &dep in deps {
            dependents[dep].push(index);
        }
    }

    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(index, _)| index)
        .collect();
    let mut order = Vec::with_capacity(modules.len());

    while let Some(index) = ready.pop_first() {
        order.push(index);
        for &dependent in &dependents[index] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() == modules.len() {
        return Ok(order);
    }

    let blocked: Vec<usize> = (0..modules.len())
        .filter(|&index| in_degree[index] > 0)
        .collect();
    let cycle = find_cycle(dependencies, &blocked)
        .into_iter()
        .map(|index| modules[index].id().to_string())
        .collect();
    Err(Error::CyclicDependency { cycle })
}

/// Walk dependency edges from the first blocked module until a node repeats
///
/// Every blocked module has at least one blocked dependency, so the walk
/// always closes a cycle.
fn find_cycle(dependencies: &[BTreeSet<usize>], blocked: &[usize]) -> Vec<usize> {
    let blocked_set: HashSet<usize> = blocked.iter().copied().collect();
    let Some(&start) = blocked.first() else {
        return Vec::new();
    };

    let mut path: Vec<usize> = Vec::new();
    let mut current = start;
    loop {
        if let Some(position) = path.iter().position(|&seen| seen == current) {
            let mut cycle = path.split_off(position);
            cycle.push(current);
            return cycle;
        }
        path.push(current);
        match dependencies[current]
            .iter()
            .copied()
            .find(|dep| blocked_set.contains(dep))
        {
            Some(next) => current = next,
            None => return path,
        }
    }
}

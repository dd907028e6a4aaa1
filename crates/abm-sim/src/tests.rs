//! Unit tests for abm-sim.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use abm_core::{CoreError, ReplicationId, ScenarioId, ValueType};
use abm_plan::PlanError;
use abm_plugin::PluginError;

use crate::*;

// ── Fixture ───────────────────────────────────────────────────────────────────

const INFECTED: PropertyId = PropertyId(0); // Bool, default false, time tracked
const AGE: PropertyId = PropertyId(1); // Int, no default
const VACCINATED: PropertyId = PropertyId(2); // Bool, default false, immutable

const INFECTION: PartitionId = PartitionId::new("infection");

/// Agent `i` is `20 + i` years old.
fn properties(n: u32) -> AgentPropertiesPluginData {
    let builder = AgentPropertiesPluginData::builder()
        .define_property(
            INFECTED,
            PropertyDefinition::builder(ValueType::Bool)
                .default_value(false)
                .track_time(true)
                .build()
                .unwrap(),
        )
        .define_property(AGE, PropertyDefinition::builder(ValueType::Int).build().unwrap())
        .define_property(
            VACCINATED,
            PropertyDefinition::builder(ValueType::Bool)
                .default_value(false)
                .immutable()
                .build()
                .unwrap(),
        );
    (0..n)
        .fold(builder, |b, i| b.set_value(AgentIndex(i), AGE, 20 + i as i32))
        .build()
        .unwrap()
}

fn builder(n: u32, config: SimConfig) -> SimBuilder {
    SimBuilder::new(config)
        .add_plugin(agents_plugin(AgentsPluginData::new(n)))
        .add_plugin(agent_properties_plugin(properties(n)))
}

fn sim(n: u32) -> Sim {
    builder(n, SimConfig::with_seed(7)).build().unwrap()
}

fn a(i: u32) -> AgentIndex {
    AgentIndex(i)
}

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn push(log: &Log, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

// ── Run loop ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod run_loop {
    use super::*;

    #[test]
    fn plans_execute_in_time_order() {
        let mut sim = sim(0);
        let order = log();
        for t in [2.0, 0.5, 1.0] {
            let order = order.clone();
            sim.add_plan(t, move |sim| {
                push(&order, format!("{}", sim.now()));
                Ok(())
            })
            .unwrap();
        }
        let summary = sim.run().unwrap();
        assert_eq!(entries(&order), ["0.5", "1", "2"]);
        assert_eq!(summary.stop, StopReason::Exhausted);
        assert_eq!(summary.end_time, 2.0);
        assert_eq!(summary.plans_executed, 3);
    }

    #[test]
    fn same_time_plans_from_inside_a_plan_run_fifo() {
        let mut sim = sim(0);
        let order = log();
        let inner = order.clone();
        sim.add_plan(1.0, move |sim| {
            push(&inner, "first");
            for name in ["a", "b"] {
                let inner = inner.clone();
                sim.add_plan(sim.now(), move |_| {
                    push(&inner, name);
                    Ok(())
                })?;
            }
            Ok(())
        })
        .unwrap();
        let queued = order.clone();
        sim.add_plan(1.0, move |_| {
            push(&queued, "queued");
            Ok(())
        })
        .unwrap();
        sim.run().unwrap();
        assert_eq!(entries(&order), ["first", "queued", "a", "b"]);
    }

    #[test]
    fn past_time_rejected() {
        let mut sim = sim(0);
        let result = Rc::new(RefCell::new(None));
        let out = result.clone();
        sim.add_plan(5.0, move |sim| {
            *out.borrow_mut() = Some(sim.add_plan(4.0, |_| Ok(())).map(|_| ()));
            Ok(())
        })
        .unwrap();
        sim.run().unwrap();
        assert_eq!(
            result.borrow_mut().take(),
            Some(Err(SimError::Plan(PlanError::PastTime { now: 5.0, requested: 4.0 })))
        );
    }

    #[test]
    fn non_finite_time_rejected() {
        let mut sim = sim(0);
        assert!(matches!(
            sim.add_plan(f64::NAN, |_| Ok(())),
            Err(SimError::Plan(PlanError::InvalidTime(_)))
        ));
    }

    #[test]
    fn halt_stops_after_current_plan() {
        let mut sim = sim(0);
        let ran = Rc::new(Cell::new(false));
        sim.add_plan(1.0, |sim| {
            sim.halt();
            Ok(())
        })
        .unwrap();
        let flag = ran.clone();
        sim.add_plan(2.0, move |_| {
            flag.set(true);
            Ok(())
        })
        .unwrap();
        let summary = sim.run().unwrap();
        assert_eq!(summary.stop, StopReason::Halted);
        assert_eq!(summary.end_time, 1.0);
        assert!(!ran.get());
    }

    #[test]
    fn halt_time_is_inclusive() {
        let config = SimConfig { halt_time: Some(3.0), ..SimConfig::with_seed(1) };
        let mut sim = builder(0, config).build().unwrap();
        let order = log();
        for t in [3.0, 3.5] {
            let order = order.clone();
            sim.add_plan(t, move |_| {
                push(&order, format!("{t}"));
                Ok(())
            })
            .unwrap();
        }
        let summary = sim.run().unwrap();
        assert_eq!(entries(&order), ["3"]);
        assert_eq!(summary.stop, StopReason::HaltTime);
    }

    #[test]
    fn cancelled_plan_never_runs() {
        let mut sim = sim(0);
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        let id = sim
            .add_plan(1.0, move |_| {
                flag.set(true);
                Ok(())
            })
            .unwrap();
        assert!(sim.is_plan_pending(id));
        assert!(sim.cancel_plan(id));
        assert!(!sim.cancel_plan(id));
        let summary = sim.run().unwrap();
        assert!(!ran.get());
        assert_eq!(summary.plans_executed, 0);
    }

    #[test]
    fn passive_plans_alone_do_not_run() {
        let mut sim = sim(0);
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        sim.add_passive_plan(1.0, move |_| {
            flag.set(true);
            Ok(())
        })
        .unwrap();
        assert_eq!(sim.run().unwrap().plans_executed, 0);
        assert!(!ran.get());
    }

    #[test]
    fn plan_error_aborts_run() {
        let mut sim = sim(0);
        let ran = Rc::new(Cell::new(false));
        sim.add_plan(1.0, |_| Err(SimError::Model("boom".into()))).unwrap();
        let flag = ran.clone();
        sim.add_plan(2.0, move |_| {
            flag.set(true);
            Ok(())
        })
        .unwrap();
        assert_eq!(sim.run(), Err(SimError::Model("boom".into())));
        assert!(!ran.get());
    }

    #[test]
    fn second_run_rejected() {
        let mut sim = sim(0);
        sim.run().unwrap();
        assert_eq!(sim.run(), Err(SimError::AlreadyStarted));
    }

    #[test]
    fn observer_sees_every_plan() {
        #[derive(Default)]
        struct Counting {
            started: bool,
            plans:   Vec<f64>,
            summary: Option<RunSummary>,
        }
        impl SimObserver for Counting {
            fn on_run_start(&mut self, _time: f64) {
                self.started = true;
            }
            fn on_plan(&mut self, time: f64, _owner: PlanOwner) {
                self.plans.push(time);
            }
            fn on_run_end(&mut self, summary: &RunSummary) {
                self.summary = Some(summary.clone());
            }
        }

        let mut sim = sim(0);
        sim.add_plan(1.0, |_| Ok(())).unwrap();
        sim.add_plan(4.0, |_| Ok(())).unwrap();
        let mut observer = Counting::default();
        let summary = sim.run_with(&mut observer).unwrap();
        assert!(observer.started);
        assert_eq!(observer.plans, [1.0, 4.0]);
        assert_eq!(observer.summary, Some(summary));
    }
}

// ── Plugins ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod plugins {
    use super::*;

    type Shared = Arc<Mutex<Vec<String>>>;

    fn recording(id: &'static str, deps: &[&'static str], log: &Shared) -> SimPlugin {
        let log = Arc::clone(log);
        deps.iter()
            .fold(SimPlugin::builder(PluginId::new(id)), |b, d| b.depends_on(PluginId::new(*d)))
            .init(move |_| {
                log.lock().unwrap().push(id.to_string());
                Ok(())
            })
            .build()
    }

    struct Ledger;
    impl DataManager for Ledger {}

    #[test]
    fn initializers_run_in_dependency_order() {
        let shared: Shared = Arc::default();
        SimBuilder::new(SimConfig::default())
            .add_plugin(recording("reports", &["disease"], &shared))
            .add_plugin(recording("disease", &["people"], &shared))
            .add_plugin(recording("people", &[], &shared))
            .build()
            .unwrap();
        assert_eq!(*shared.lock().unwrap(), ["people", "disease", "reports"]);
    }

    #[test]
    fn missing_dependency_fails_before_any_initializer() {
        let shared: Shared = Arc::default();
        let result = SimBuilder::new(SimConfig::default())
            .add_plugin(recording("a", &[], &shared))
            .add_plugin(recording("b", &["ghost"], &shared))
            .build();
        assert!(matches!(
            result,
            Err(SimError::Plugin(PluginError::MissingDependency { plugin, dependency }))
                if plugin == PluginId::new("b") && dependency == PluginId::new("ghost")
        ));
        assert!(shared.lock().unwrap().is_empty());
    }

    #[test]
    fn cycle_fails_before_any_initializer() {
        let shared: Shared = Arc::default();
        let result = SimBuilder::new(SimConfig::default())
            .add_plugin(recording("x", &["y"], &shared))
            .add_plugin(recording("y", &["x"], &shared))
            .build();
        assert!(matches!(result, Err(SimError::Plugin(PluginError::DependencyCycle(_)))));
        assert!(shared.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_data_manager_is_an_error() {
        let sim = sim(1);
        assert!(matches!(
            sim.data_manager::<Ledger>(),
            Err(SimError::Plugin(PluginError::UnknownDataManager(_)))
        ));
        assert!(sim.has_data_manager::<AgentsManager>());
    }

    #[test]
    fn data_manager_after_start_rejected() {
        let mut sim = sim(1);
        sim.run().unwrap();
        assert!(matches!(
            sim.register_data_manager(PluginId::new("late"), Ledger),
            Err(SimError::Plugin(PluginError::DataManagerAfterStart(_)))
        ));
    }

    #[test]
    fn plugin_data_builder_round_trip() {
        let data = properties(2);
        let copy = data.to_builder().build().unwrap();
        assert_eq!(copy, data);

        let changed = data.to_builder().set_value(a(0), AGE, 99).build().unwrap();
        assert_eq!(data.value(a(0), AGE), Some(&PropertyValue::Int(20)));
        assert_eq!(changed.value(a(0), AGE), Some(&PropertyValue::Int(99)));
        assert_eq!(changed.value(a(1), AGE), Some(&PropertyValue::Int(21)));
        assert_eq!(changed.definitions().count(), 3);
    }

    #[test]
    fn plugin_data_builder_requires_values_without_default() {
        let result = properties(1).to_builder().set_value(a(4), INFECTED, true).build();
        assert_eq!(result, Err(SimError::MissingPropertyValue { agent: a(4), property: AGE }));
    }

    #[test]
    fn plugin_data_builder_rejects_wrong_type() {
        let result = properties(1).to_builder().set_value(a(0), AGE, true).build();
        assert!(matches!(result, Err(SimError::Core(CoreError::IncompatibleValue { .. }))));
    }

    #[test]
    fn initial_population_needs_every_required_value() {
        let result = SimBuilder::new(SimConfig::default())
            .add_plugin(agents_plugin(AgentsPluginData::new(3)))
            .add_plugin(agent_properties_plugin(properties(2)))
            .build();
        assert!(matches!(
            result,
            Err(SimError::MissingPropertyValue { agent, property }) if agent == a(2) && property == AGE
        ));
    }

    #[test]
    fn reports_start_first_and_never_extend_the_run() {
        let shared: Shared = Arc::default();
        let init_log = Arc::clone(&shared);
        let plugin = SimPlugin::builder(PluginId::new("model"))
            .depends_on(AGENT_PROPERTIES)
            .init(move |ctx| {
                let actor_log = Arc::clone(&init_log);
                ctx.add_actor(move |sim| {
                    actor_log.lock().unwrap().push("actor".into());
                    let later = Arc::clone(&actor_log);
                    sim.add_plan(1.0, move |_| {
                        later.lock().unwrap().push("actor plan".into());
                        Ok(())
                    })?;
                    Ok(())
                })?;
                let report_log = Arc::clone(&init_log);
                ctx.add_report(move |sim| {
                    report_log.lock().unwrap().push("report".into());
                    let later = Arc::clone(&report_log);
                    sim.add_plan(10.0, move |_| {
                        later.lock().unwrap().push("report plan".into());
                        Ok(())
                    })?;
                    Ok(())
                })?;
                Ok(())
            })
            .build();

        let mut sim = builder(1, SimConfig::default()).add_plugin(plugin).build().unwrap();
        let summary = sim.run().unwrap();
        assert_eq!(*shared.lock().unwrap(), ["report", "actor", "actor plan"]);
        assert_eq!(summary.end_time, 1.0);
    }
}

// ── Agents and properties ─────────────────────────────────────────────────────

#[cfg(test)]
mod agents_and_properties {
    use super::*;

    #[test]
    fn initial_population_loaded() {
        let sim = sim(3);
        assert_eq!(sim.population(), Ok(3));
        assert_eq!(sim.agents(), Ok(vec![a(0), a(1), a(2)]));
        assert_eq!(sim.property_value(a(2), AGE), Ok(PropertyValue::Int(22)));
        assert_eq!(sim.property_value(a(2), INFECTED), Ok(PropertyValue::Bool(false)));
        assert_eq!(sim.property_ids(), [INFECTED, AGE, VACCINATED]);
    }

    #[test]
    fn add_agent_validates_before_issuing_an_index() {
        let mut sim = sim(2);
        assert_eq!(
            sim.add_agent(vec![]),
            Err(SimError::MissingPropertyValue { agent: a(2), property: AGE })
        );
        assert!(matches!(
            sim.add_agent(vec![(AGE, PropertyValue::Bool(true))]),
            Err(SimError::Core(CoreError::IncompatibleValue { .. }))
        ));
        assert!(matches!(
            sim.add_agent(vec![(AGE, 1.into()), (PropertyId(9), 1.into())]),
            Err(SimError::Core(CoreError::UnknownProperty(PropertyId(9))))
        ));
        assert_eq!(sim.population(), Ok(2));
        assert_eq!(sim.add_agent(vec![(AGE, 40.into())]), Ok(a(2)));
    }

    #[test]
    fn agent_added_subscribers_see_initial_values() {
        let mut sim = sim(0);
        let seen = Rc::new(Cell::new(None));
        let out = seen.clone();
        sim.subscribe(move |sim: &mut Sim, e: &AgentAdded| {
            out.set(sim.property_value(e.agent, AGE)?.as_i64());
            Ok(())
        });
        sim.add_agent(vec![(AGE, 33.into())]).unwrap();
        assert_eq!(seen.get(), Some(33));
    }

    #[test]
    fn removed_index_is_never_reused() {
        let mut sim = sim(2);
        sim.remove_agent(a(0)).unwrap();
        assert_eq!(sim.agent_exists(a(0)), Ok(false));
        assert_eq!(sim.population(), Ok(1));
        assert_eq!(sim.property_value(a(0), AGE), Err(SimError::AgentNotFound(a(0))));
        assert_eq!(sim.remove_agent(a(0)), Err(SimError::AgentNotFound(a(0))));
        assert_eq!(sim.add_agent(vec![(AGE, 5.into())]), Ok(a(2)));
        assert_eq!(sim.agents(), Ok(vec![a(1), a(2)]));
    }

    #[test]
    fn set_property_publishes_previous_and_current() {
        let mut sim = sim(2);
        let updates = Rc::new(RefCell::new(Vec::new()));
        let out = updates.clone();
        sim.subscribe(move |_: &mut Sim, e: &PropertyUpdate| {
            out.borrow_mut().push(e.clone());
            Ok(())
        });
        sim.set_property(a(1), AGE, 50).unwrap();
        assert_eq!(
            *updates.borrow(),
            [PropertyUpdate {
                agent:    a(1),
                property: AGE,
                previous: PropertyValue::Int(21),
                current:  PropertyValue::Int(50),
            }]
        );
        assert_eq!(sim.property_value(a(1), AGE), Ok(PropertyValue::Int(50)));
    }

    #[test]
    fn set_property_rejections() {
        let mut sim = sim(1);
        assert_eq!(sim.set_property(a(0), VACCINATED, true), Err(SimError::ImmutableProperty(VACCINATED)));
        assert_eq!(sim.set_property(a(5), AGE, 1), Err(SimError::AgentNotFound(a(5))));
        assert_eq!(
            sim.set_property(a(0), PropertyId(9), 1),
            Err(SimError::Core(CoreError::UnknownProperty(PropertyId(9))))
        );
        assert!(matches!(
            sim.set_property(a(0), AGE, 1.5),
            Err(SimError::Core(CoreError::IncompatibleValue { .. }))
        ));
        assert_eq!(sim.property_value(a(0), AGE), Ok(PropertyValue::Int(20)));
    }

    #[test]
    fn property_time_follows_assignments() {
        let mut sim = sim(2);
        sim.add_plan(2.5, |sim| sim.set_property(a(0), INFECTED, true)).unwrap();
        sim.run().unwrap();
        assert_eq!(sim.property_time(a(0), INFECTED), Ok(2.5));
        assert_eq!(sim.property_time(a(1), INFECTED), Ok(0.0));
        assert_eq!(sim.property_time(a(0), AGE), Err(SimError::TimeNotTracked(AGE)));
    }

    #[test]
    fn labeled_subscriptions_narrow_delivery() {
        let mut sim = sim(2);
        let by_property = Rc::new(Cell::new(0));
        let by_agent = Rc::new(Cell::new(0));
        let count = by_property.clone();
        sim.subscribe_labeled(property_update_label(INFECTED), move |_: &mut Sim, _: &PropertyUpdate| {
            count.set(count.get() + 1);
            Ok(())
        })
        .unwrap();
        let count = by_agent.clone();
        sim.subscribe_labeled(
            agent_property_update_label(a(1), INFECTED),
            move |_: &mut Sim, _: &PropertyUpdate| {
                count.set(count.get() + 1);
                Ok(())
            },
        )
        .unwrap();

        sim.set_property(a(0), AGE, 30).unwrap();
        sim.set_property(a(0), INFECTED, true).unwrap();
        sim.set_property(a(1), INFECTED, true).unwrap();
        assert_eq!(by_property.get(), 2);
        assert_eq!(by_agent.get(), 1);
    }

    #[test]
    fn define_property_at_runtime() {
        let mut sim = sim(2);
        let defined = Rc::new(Cell::new(None));
        let out = defined.clone();
        sim.subscribe(move |_: &mut Sim, e: &PropertyDefined| {
            out.set(Some(e.property));
            Ok(())
        });

        let dose = PropertyId(7);
        let definition = PropertyDefinition::builder(ValueType::Int).default_value(0).build().unwrap();
        sim.define_property(dose, definition.clone()).unwrap();
        assert_eq!(defined.get(), Some(dose));
        assert_eq!(sim.property_value(a(1), dose), Ok(PropertyValue::Int(0)));
        assert_eq!(sim.define_property(dose, definition), Err(SimError::DuplicateProperty(dose)));

        let required = PropertyDefinition::builder(ValueType::Int).build().unwrap();
        assert_eq!(
            sim.define_property(PropertyId(8), required),
            Err(SimError::MissingPropertyValue { agent: a(0), property: PropertyId(8) })
        );
    }

    #[test]
    fn nested_publish_completes_first() {
        let mut sim = sim(0);
        let order = log();
        let first = order.clone();
        sim.subscribe(move |sim: &mut Sim, e: &AgentAdded| {
            push(&first, "added 1");
            sim.set_property(e.agent, INFECTED, true)
        });
        let update = order.clone();
        sim.subscribe(move |_: &mut Sim, _: &PropertyUpdate| {
            push(&update, "update");
            Ok(())
        });
        let second = order.clone();
        sim.subscribe(move |_: &mut Sim, _: &AgentAdded| {
            push(&second, "added 2");
            Ok(())
        });
        sim.add_agent(vec![(AGE, 1.into())]).unwrap();
        assert_eq!(entries(&order), ["added 1", "update", "added 2"]);
    }
}

// ── Partitions ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod partitions {
    use super::*;

    fn by_infection() -> Partition<Sim> {
        Partition::new().with_labeler(Labeler::property(INFECTED))
    }

    fn infected(value: bool) -> LabelSet {
        LabelSet::exact([Label::Bool(value)])
    }

    #[test]
    fn only_the_updated_agent_is_reevaluated() {
        let mut sim = sim(3);
        sim.add_partition(INFECTION, by_infection()).unwrap();
        assert_eq!(sim.partition_evaluations(INFECTION), Ok(3));

        sim.set_property(a(1), INFECTED, true).unwrap();
        assert_eq!(sim.partition_evaluations(INFECTION), Ok(4));
        assert_eq!(sim.query_partition(INFECTION, &infected(true), None), Ok(vec![a(1)]));
        assert_eq!(sim.query_partition(INFECTION, &infected(false), None), Ok(vec![a(0), a(2)]));

        // Unrelated property: no evaluation at all.
        sim.set_property(a(2), AGE, 60).unwrap();
        assert_eq!(sim.partition_evaluations(INFECTION), Ok(4));
    }

    #[test]
    fn subscribers_see_the_partition_already_updated() {
        let mut sim = sim(2);
        sim.add_partition(INFECTION, by_infection()).unwrap();
        let seen = Rc::new(Cell::new(None));
        let out = seen.clone();
        sim.subscribe(move |sim: &mut Sim, e: &PropertyUpdate| {
            out.set(Some(sim.partition_contains(INFECTION, e.agent, &infected(true))?));
            Ok(())
        });
        sim.set_property(a(0), INFECTED, true).unwrap();
        assert_eq!(seen.get(), Some(true));
    }

    #[test]
    fn added_and_removed_agents_tracked() {
        let mut sim = sim(2);
        sim.add_partition(INFECTION, by_infection()).unwrap();
        let agent = sim.add_agent(vec![(AGE, 1.into()), (INFECTED, true.into())]).unwrap();
        assert!(sim.partition_contains(INFECTION, agent, &infected(true)).unwrap());
        assert_eq!(sim.partition_count(INFECTION, &LabelSet::any()), Ok(3));

        sim.remove_agent(agent).unwrap();
        assert!(!sim.partition_contains(INFECTION, agent, &LabelSet::any()).unwrap());
        assert_eq!(sim.partition_count(INFECTION, &LabelSet::any()), Ok(2));
    }

    #[test]
    fn filtered_partition_and_ad_hoc_filter() {
        let mut sim = sim(4); // ages 20..=23
        let adults = Partition::new()
            .with_labeler(Labeler::property(INFECTED))
            .with_filter(Filter::property(AGE, Equality::GreaterThanEqual, 21));
        sim.add_partition(INFECTION, adults).unwrap();
        assert_eq!(sim.partition_count(INFECTION, &LabelSet::any()), Ok(3));

        sim.set_property(a(0), AGE, 30).unwrap();
        sim.set_property(a(3), AGE, 18).unwrap();
        assert_eq!(sim.query_partition(INFECTION, &LabelSet::any(), None), Ok(vec![a(0), a(1), a(2)]));

        let young = Filter::property(AGE, Equality::LessThan, 25);
        assert_eq!(
            sim.query_partition(INFECTION, &LabelSet::any(), Some(&young)),
            Ok(vec![a(1), a(2)])
        );
    }

    #[test]
    fn custom_labeler_with_sensitivity() {
        let mut sim = sim(3);
        let decade = Labeler::custom(
            "decade",
            |sim: &Sim, agent| {
                let age = sim.property_value(agent, AGE).ok().and_then(|v| v.as_i64()).unwrap_or(0);
                Label::Int(age / 10)
            },
            vec![Sensitivity::property_update(AGE)],
        );
        sim.add_partition(INFECTION, Partition::new().with_labeler(decade)).unwrap();
        sim.set_property(a(2), AGE, 45).unwrap();
        assert_eq!(
            sim.query_partition(INFECTION, &LabelSet::exact([Label::Int(2)]), None),
            Ok(vec![a(0), a(1)])
        );
        assert_eq!(
            sim.query_partition(INFECTION, &LabelSet::exact([Label::Int(4)]), None),
            Ok(vec![a(2)])
        );
    }

    #[test]
    fn sampling_honours_exclusion() {
        let mut sim = sim(2);
        sim.add_partition(INFECTION, by_infection()).unwrap();
        for _ in 0..20 {
            assert_eq!(sim.sample_partition(INFECTION, &infected(false), Some(a(0))), Ok(Some(a(1))));
        }
        assert_eq!(sim.sample_partition(INFECTION, &infected(true), None), Ok(None));
    }

    #[test]
    fn partition_registry_errors() {
        let mut sim = sim(1);
        sim.add_partition(INFECTION, by_infection()).unwrap();
        assert_eq!(
            sim.add_partition(INFECTION, by_infection()),
            Err(SimError::Partition(abm_partition::PartitionError::DuplicatePartition(INFECTION)))
        );
        assert!(sim.remove_partition(INFECTION));
        assert!(!sim.remove_partition(INFECTION));
        assert!(!sim.partition_exists(INFECTION));
        assert_eq!(
            sim.partition_count(INFECTION, &LabelSet::any()),
            Err(SimError::Partition(abm_partition::PartitionError::UnknownPartition(INFECTION)))
        );
    }

    fn census(dependencies: &[PluginId]) -> SimPlugin {
        dependencies
            .iter()
            .fold(SimPlugin::builder(PluginId::new("census")), |b, &d| b.depends_on(d))
            .init(|ctx| {
                let everyone = Labeler::custom("everyone", |_: &Sim, _| Label::Bool(true), vec![]);
                ctx.add_partition(INFECTION, Partition::new().with_labeler(everyone))
            })
            .build()
    }

    #[test]
    fn partition_before_agents_plugin_is_rejected() {
        let result = SimBuilder::new(SimConfig::default())
            .add_plugin(census(&[]))
            .add_plugin(agents_plugin(AgentsPluginData::new(3)))
            .build();
        assert!(matches!(
            result,
            Err(SimError::Plugin(PluginError::UnknownDataManager(name))) if name.ends_with("AgentsManager")
        ));
    }

    #[test]
    fn partition_added_during_init_sees_initial_population() {
        let sim = SimBuilder::new(SimConfig::default())
            .add_plugin(census(&[AGENTS]))
            .add_plugin(agents_plugin(AgentsPluginData::new(3)))
            .build()
            .unwrap();
        assert_eq!(sim.partition_count(INFECTION, &LabelSet::any()), Ok(3));
        assert_eq!(sim.population(), Ok(3));
    }

    #[test]
    fn population_without_agents_plugin_is_an_error() {
        let sim = SimBuilder::new(SimConfig::default()).build().unwrap();
        assert!(matches!(sim.population(), Err(SimError::Plugin(PluginError::UnknownDataManager(_)))));
        assert!(matches!(sim.agents(), Err(SimError::Plugin(PluginError::UnknownDataManager(_)))));
        assert!(matches!(
            sim.agent_exists(a(0)),
            Err(SimError::Plugin(PluginError::UnknownDataManager(_)))
        ));
    }

    #[test]
    fn removing_one_partition_leaves_the_other_current() {
        const ADULTS: PartitionId = PartitionId::new("adults");
        let mut sim = sim(3); // ages 20..=22
        sim.add_partition(INFECTION, by_infection()).unwrap();
        let adults = Partition::new()
            .with_labeler(Labeler::property(INFECTED))
            .with_filter(Filter::property(AGE, Equality::GreaterThanEqual, 21));
        sim.add_partition(ADULTS, adults).unwrap();

        assert!(sim.remove_partition(INFECTION));
        sim.set_property(a(1), INFECTED, true).unwrap();
        sim.set_property(a(0), AGE, 40).unwrap();
        let agent = sim.add_agent(vec![(AGE, 50.into()), (INFECTED, true.into())]).unwrap();

        assert_eq!(sim.query_partition(ADULTS, &infected(true), None), Ok(vec![a(1), agent]));
        assert_eq!(sim.query_partition(ADULTS, &infected(false), None), Ok(vec![a(0), a(2)]));
        assert!(!sim.partition_exists(INFECTION));
    }

    #[test]
    fn unlabelable_property_rejected() {
        let mut sim = sim(1);
        let by_name = Partition::new().with_labeler(Labeler::property(PropertyId(9)));
        assert!(matches!(sim.add_partition(INFECTION, by_name), Err(SimError::Partition(_))));
        assert!(!sim.partition_exists(INFECTION));
    }
}

// ── Determinism and output ────────────────────────────────────────────────────

#[cfg(test)]
mod determinism {
    use super::*;

    fn step(sim: &mut Sim) -> SimResult<()> {
        if sim.now() >= 10.0 {
            return Ok(());
        }
        let agent = AgentIndex(sim.rng().gen_range(0..3u32));
        let value = sim.rng().gen_bool(0.5);
        sim.set_property(agent, INFECTED, value)?;
        sim.release_output("walk", vec![agent.to_string(), value.to_string()]);
        let next = sim.now() + sim.rng().exponential(1.0);
        sim.add_plan(next, step)?;
        Ok(())
    }

    fn run_seeded(seed: u64) -> Vec<OutputRecord> {
        let sink = Arc::new(CollectingSink::new());
        let walk = SimPlugin::builder(PluginId::new("walk"))
            .depends_on(AGENT_PROPERTIES)
            .init(|ctx| ctx.add_actor(step).map(|_| ()))
            .build();
        let mut sim = builder(3, SimConfig::with_seed(seed))
            .add_plugin(walk)
            .output(sink.clone())
            .build()
            .unwrap();
        sim.run().unwrap();
        sink.take()
    }

    #[test]
    fn same_seed_same_trajectory() {
        let first = run_seeded(11);
        assert!(!first.is_empty());
        assert_eq!(first, run_seeded(11));
    }

    #[test]
    fn output_records_are_stamped() {
        let sink = Arc::new(CollectingSink::new());
        let config = SimConfig {
            scenario: ScenarioId(2),
            replication: ReplicationId(5),
            ..SimConfig::default()
        };
        let mut sim = builder(0, config).output(sink.clone()).build().unwrap();
        sim.add_plan(1.5, |sim| {
            sim.release_output("probe", vec!["x".into()]);
            Ok(())
        })
        .unwrap();
        sim.run().unwrap();
        assert_eq!(
            sink.take(),
            [OutputRecord {
                scenario:    ScenarioId(2),
                replication: ReplicationId(5),
                time:        1.5,
                source:      "probe",
                values:      vec!["x".into()],
            }]
        );
    }
}

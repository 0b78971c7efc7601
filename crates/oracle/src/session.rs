//! Analysis session: owns every registry for one run and drives the
//! register -> resolve -> defer -> retry cycle unit by unit.
//!
//! A report is written once every method its entry points reach is
//! registered. Reaching a missing method of the same namespace parks the
//! report on the wait-list; reaching a missing method of another namespace
//! blocks it for the rest of the session. A written report that fanned out
//! over an interface method is written again when that interface gains a
//! new implementation, so the result does not depend on unit order.

use crate::index::ImplementationIndex;
use crate::resolver::Resolver;
use crate::waitlist::{WaitList, WaitListEntry};
use common::{AnalysisConfig, FactRegistry, MethodIdentity, MethodRecord, UnitFacts};
use scribe::{Purpose, Report, ReportSink};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Result of resolving the entry points of one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Everything reachable is registered; the report was handed to the sink.
    Finalized(Report),
    /// Some same-namespace callees are not registered yet. The report holds
    /// what is known so far; the entry now sits on the wait-list.
    Pending {
        partial: Report,
        waiting_for: BTreeSet<MethodIdentity>,
    },
    /// Unregistered methods outside the namespace are reachable. The entry
    /// is never retried and no report is written for it.
    Blocked {
        partial: Report,
        out_of_scope: BTreeSet<MethodIdentity>,
    },
}

impl Resolution {
    pub fn report(&self) -> &Report {
        match self {
            Resolution::Finalized(report) => report,
            Resolution::Pending { partial, .. } | Resolution::Blocked { partial, .. } => partial,
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, Resolution::Finalized(_))
    }
}

/// What happened while ingesting one unit.
#[derive(Debug, Default)]
pub struct UnitOutcome {
    pub skipped: bool,
    pub registered: usize,
    pub duplicates: usize,
    /// Resolution of the unit's own entry points, if it declares any.
    pub resolution: Option<Resolution>,
    /// Deferred reports retried because this unit supplied their last missing method.
    pub retried: Vec<(String, Resolution)>,
    /// Written reports resolved again because an interface they reach gained
    /// an implementation in this unit.
    pub refreshed: Vec<(String, Resolution)>,
}

/// Running counters for a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub units_seen: usize,
    pub units_skipped: usize,
    pub methods_registered: usize,
    pub duplicate_registrations: usize,
    pub abstract_skipped: usize,
    pub reports_written: usize,
    pub write_failures: usize,
    pub retries: usize,
    pub refreshes: usize,
}

/// Returned by [`Session::finish`].
#[derive(Debug)]
pub struct SessionSummary {
    pub stats: SessionStats,
    /// Wait-list entries never released, ordered by report name.
    pub unresolved: Vec<WaitListEntry>,
    /// Entries blocked on methods outside the namespace, ordered by report
    /// name. `waiting_for` holds the out-of-scope methods.
    pub out_of_scope: Vec<WaitListEntry>,
    pub partial_reports_written: usize,
}

pub struct Session<S: ReportSink> {
    config: AnalysisConfig,
    registry: FactRegistry,
    index: ImplementationIndex,
    wait_list: WaitList,
    blocked: BTreeMap<String, WaitListEntry>,
    /// Entry points of every written report, by report name.
    finalized: HashMap<String, Vec<MethodIdentity>>,
    /// interface method -> written reports whose resolution fanned out over it
    dispatch_readers: HashMap<MethodIdentity, BTreeSet<String>>,
    sink: S,
    stats: SessionStats,
}

impl<S: ReportSink> Session<S> {
    pub fn new(config: AnalysisConfig, sink: S) -> Self {
        Self {
            config,
            registry: FactRegistry::new(),
            index: ImplementationIndex::new(),
            wait_list: WaitList::new(),
            blocked: BTreeMap::new(),
            finalized: HashMap::new(),
            dispatch_readers: HashMap::new(),
            sink,
            stats: SessionStats::default(),
        }
    }

    /// Registers one unit's facts, resolves its entry points, retries every
    /// deferred report the new registrations have unblocked, and refreshes
    /// written reports whose interfaces gained an implementation.
    pub fn ingest(&mut self, unit: &UnitFacts) -> UnitOutcome {
        self.stats.units_seen += 1;
        let mut outcome = UnitOutcome::default();

        if self.config.skips_unit(&unit.name) {
            tracing::debug!(unit = %unit.name, "skipping unit");
            self.stats.units_skipped += 1;
            outcome.skipped = true;
            return outcome;
        }

        let mut announced: Vec<MethodIdentity> = Vec::new();
        let mut widened: BTreeSet<MethodIdentity> = BTreeSet::new();
        for facts in &unit.methods {
            if facts.is_abstract {
                self.stats.abstract_skipped += 1;
                continue;
            }
            if self.registry.register(MethodRecord::from_facts(facts)).is_none() {
                outcome.duplicates += 1;
                self.stats.duplicate_registrations += 1;
                continue;
            }
            outcome.registered += 1;
            self.stats.methods_registered += 1;

            // An implementation makes the interface method resolvable too.
            for interface_method in &facts.implements {
                if self.index.add(interface_method.clone(), facts.identity.clone()) {
                    widened.insert(interface_method.clone());
                }
                announced.push(interface_method.clone());
            }
            announced.push(facts.identity.clone());
        }

        tracing::debug!(
            unit = %unit.name,
            registered = outcome.registered,
            duplicates = outcome.duplicates,
            "unit registered"
        );

        let mut resolved_now: BTreeSet<String> = BTreeSet::new();

        let entry_points = unit.entry_points();
        if !entry_points.is_empty() {
            outcome.resolution = Some(self.handle_results(&unit.name, entry_points));
            resolved_now.insert(unit.name.clone());
        }

        for entry in self.wait_list.on_new_registrations(&announced) {
            tracing::info!(report = %entry.name, "retrying deferred report");
            self.stats.retries += 1;
            let resolution = self.handle_results(&entry.name, entry.entry_points);
            resolved_now.insert(entry.name.clone());
            outcome.retried.push((entry.name, resolution));
        }

        let stale: BTreeSet<String> = widened
            .iter()
            .filter_map(|iface| self.dispatch_readers.get(iface))
            .flatten()
            .filter(|name| !resolved_now.contains(*name))
            .cloned()
            .collect();
        for name in stale {
            let Some(entry_points) = self.finalized.get(&name).cloned() else {
                continue;
            };
            tracing::info!(report = %name, "new implementation reached, rewriting report");
            self.stats.refreshes += 1;
            let resolution = self.handle_results(&name, entry_points);
            outcome.refreshed.push((name, resolution));
        }

        outcome
    }

    /// Resolves `entry_points` from scratch and writes the report, defers it
    /// on the wait-list, or blocks it for good.
    pub fn handle_results(&mut self, name: &str, entry_points: Vec<MethodIdentity>) -> Resolution {
        let (report, unresolved) = self.build_report(name, &entry_points);
        self.finalized.remove(name);

        if !unresolved.out_of_scope.is_empty() {
            self.wait_list.remove(name);
            tracing::debug!(
                report = %name,
                out_of_scope = unresolved.out_of_scope.len(),
                "report blocked on methods outside the namespace"
            );
            self.blocked.insert(
                name.to_string(),
                WaitListEntry {
                    name: name.to_string(),
                    entry_points,
                    waiting_for: unresolved.out_of_scope.clone(),
                },
            );
            return Resolution::Blocked {
                partial: report,
                out_of_scope: unresolved.out_of_scope,
            };
        }
        self.blocked.remove(name);

        if !unresolved.pending.is_empty() {
            let registry = &self.registry;
            let index = &self.index;
            self.wait_list.record_pending(name, entry_points, unresolved.pending.clone(), |id| {
                !registry.contains(id) && !index.has_implementations(id)
            });
            return Resolution::Pending {
                partial: report,
                waiting_for: unresolved.pending,
            };
        }

        for iface in unresolved.interfaces {
            self.dispatch_readers
                .entry(iface)
                .or_default()
                .insert(name.to_string());
        }
        self.finalized.insert(name.to_string(), entry_points);
        self.emit(&report);
        Resolution::Finalized(report)
    }

    /// Ends the session. Entries still waiting or blocked are logged and
    /// returned; with `emit_partial_on_finish` a best-effort report is also
    /// written for each of them.
    pub fn finish(&mut self) -> SessionSummary {
        let unresolved = self.wait_list.drain();
        let out_of_scope: Vec<WaitListEntry> =
            std::mem::take(&mut self.blocked).into_values().collect();
        let mut partial_reports_written = 0;

        for (entry, reason) in unresolved
            .iter()
            .map(|e| (e, "report never resolved"))
            .chain(out_of_scope.iter().map(|e| (e, "report blocked outside namespace")))
        {
            let missing: Vec<String> = entry.waiting_for.iter().map(|id| id.to_string()).collect();
            tracing::warn!(report = %entry.name, missing = ?missing, "{}", reason);

            if self.config.emit_partial_on_finish {
                let (report, _) = self.build_report(&entry.name, &entry.entry_points);
                if self.emit(&report) {
                    partial_reports_written += 1;
                }
            }
        }

        SessionSummary {
            stats: self.stats,
            unresolved,
            out_of_scope,
            partial_reports_written,
        }
    }

    fn build_report(&self, name: &str, entry_points: &[MethodIdentity]) -> (Report, Unresolved) {
        let resolver = Resolver::new(&self.registry, &self.index, self.config.namespace_depth);
        let mut unresolved = Unresolved::default();
        let mut purposes = Vec::with_capacity(entry_points.len());

        for entry in entry_points {
            let resolution = resolver.resolve_entry(entry);
            purposes.push(Purpose::new(
                entry.to_string(),
                &resolution.reach.categories,
                &resolution.reach.transfers,
            ));
            unresolved.pending.extend(resolution.pending);
            unresolved.out_of_scope.extend(resolution.out_of_scope);
            unresolved.interfaces.extend(resolution.interfaces);
        }

        (Report::from_purposes(name, purposes), unresolved)
    }

    /// Write failures are logged and counted, never propagated.
    fn emit(&mut self, report: &Report) -> bool {
        match self.sink.write(report) {
            Ok(()) => {
                self.stats.reports_written += 1;
                true
            }
            Err(e) => {
                tracing::error!(report = %report.name, error = %e, "failed to write report");
                self.stats.write_failures += 1;
                false
            }
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn registry(&self) -> &FactRegistry {
        &self.registry
    }

    pub fn index(&self) -> &ImplementationIndex {
        &self.index
    }

    pub fn wait_list(&self) -> &WaitList {
        &self.wait_list
    }

    /// Entries blocked on methods outside the namespace, by report name.
    pub fn blocked(&self) -> impl Iterator<Item = &WaitListEntry> {
        self.blocked.values()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Union of the unresolved parts of every entry point of one report.
#[derive(Debug, Default)]
struct Unresolved {
    pending: BTreeSet<MethodIdentity>,
    out_of_scope: BTreeSet<MethodIdentity>,
    interfaces: BTreeSet<MethodIdentity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{MethodFacts, Transfer};
    use scribe::{DirectorySink, MemorySink};

    const WEB: &str = "com.acme.shop.app.web";

    fn id(owner: &str, method: &str) -> MethodIdentity {
        MethodIdentity::new(format!("{WEB}.{owner}"), method, Vec::<String>::new())
    }

    fn session() -> Session<MemorySink> {
        Session::new(AnalysisConfig::default(), MemorySink::new())
    }

    fn data(report: &Report) -> Vec<&str> {
        report.data.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_leaf_entry_point_finalized() {
        let mut s = session();
        let unit = UnitFacts::new(
            format!("{WEB}.Ctrl"),
            vec![MethodFacts::new(id("Ctrl", "get"))
                .entry()
                .category("Email")
                .transfer(Transfer::new("mailchimp", "https://mailchimp.com/legal"))],
        );

        let outcome = s.ingest(&unit);
        assert!(outcome.resolution.as_ref().unwrap().is_finalized());

        let report = s.sink().latest(&unit.name).unwrap();
        assert_eq!(data(report), vec!["Email"]);
        assert_eq!(report.transfers.len(), 1);
        assert_eq!(report.purposes[0].name, format!("{WEB}.Ctrl#get()"));
        assert!(s.wait_list().is_empty());
    }

    #[test]
    fn test_unit_without_entry_points_writes_nothing() {
        let mut s = session();
        let unit = UnitFacts::new(
            format!("{WEB}.Repo"),
            vec![MethodFacts::new(id("Repo", "load")).category("Email")],
        );
        let outcome = s.ingest(&unit);
        assert!(outcome.resolution.is_none());
        assert!(s.sink().reports.is_empty());
    }

    #[test]
    fn test_reregistration_is_noop() {
        let mut s = session();
        let helper = id("Helper", "load");
        s.ingest(&UnitFacts::new(
            format!("{WEB}.Helper"),
            vec![MethodFacts::new(helper.clone()).category("Email")],
        ));
        let outcome = s.ingest(&UnitFacts::new(
            format!("{WEB}.Helper2"),
            vec![MethodFacts::new(helper.clone()).category("Phone")],
        ));
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(s.registry().len(), 1);

        s.ingest(&UnitFacts::new(
            format!("{WEB}.Ctrl"),
            vec![MethodFacts::new(id("Ctrl", "get")).entry().calls(helper)],
        ));
        assert_eq!(data(s.sink().latest(&format!("{WEB}.Ctrl")).unwrap()), vec!["Email"]);
        assert_eq!(s.stats().duplicate_registrations, 1);
    }

    fn fan_out_units() -> Vec<UnitFacts> {
        let iface = id("Notifier", "notify");
        vec![
            UnitFacts::new(
                format!("{WEB}.EmailNotifier"),
                vec![MethodFacts::new(id("EmailNotifier", "notify"))
                    .category("Email")
                    .implementing(iface.clone())],
            ),
            UnitFacts::new(
                format!("{WEB}.SmsNotifier"),
                vec![MethodFacts::new(id("SmsNotifier", "notify"))
                    .category("Phone")
                    .implementing(iface.clone())],
            ),
            UnitFacts::new(
                format!("{WEB}.Ctrl"),
                vec![MethodFacts::new(id("Ctrl", "signup")).entry().calls(iface)],
            ),
        ]
    }

    #[test]
    fn test_interface_fan_out_independent_of_unit_order() {
        let units = fan_out_units();
        let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let mut s = session();
            for i in order {
                s.ingest(&units[i]);
            }
            let report = s.sink().latest(&format!("{WEB}.Ctrl")).unwrap();
            assert_eq!(data(report), vec!["Email", "Phone"], "order {order:?}");
            assert!(s.wait_list().is_empty(), "order {order:?}");
        }
    }

    #[test]
    fn test_new_implementation_rewrites_written_report() {
        let units = fan_out_units();
        let mut s = session();
        s.ingest(&units[2]);
        let outcome = s.ingest(&units[0]);
        assert_eq!(outcome.retried.len(), 1);
        assert!(outcome.refreshed.is_empty());
        assert_eq!(data(s.sink().latest(&units[2].name).unwrap()), vec!["Email"]);

        let outcome = s.ingest(&units[1]);
        assert_eq!(outcome.refreshed.len(), 1);
        assert!(outcome.refreshed[0].1.is_finalized());
        assert_eq!(s.stats().refreshes, 1);
        assert_eq!(s.sink().reports.len(), 2);
        assert_eq!(
            data(s.sink().latest(&units[2].name).unwrap()),
            vec!["Email", "Phone"]
        );
    }

    #[test]
    fn test_unrelated_implementation_leaves_reports_alone() {
        let units = fan_out_units();
        let mut s = session();
        for unit in &units {
            s.ingest(unit);
        }
        let outcome = s.ingest(&UnitFacts::new(
            format!("{WEB}.Audit"),
            vec![MethodFacts::new(id("Audit", "log"))
                .category("Address")
                .implementing(id("Logger", "log"))],
        ));
        assert!(outcome.refreshed.is_empty());
        assert_eq!(s.sink().reports.len(), 1);
    }

    #[test]
    fn test_cross_unit_deferral_and_retry() {
        let mut s = session();
        let f = id("Address", "lookup");
        let u1 = UnitFacts::new(
            format!("{WEB}.Ctrl"),
            vec![MethodFacts::new(id("Ctrl", "get"))
                .entry()
                .category("Email")
                .calls(f.clone())],
        );

        let outcome = s.ingest(&u1);
        match outcome.resolution.unwrap() {
            Resolution::Pending { partial, waiting_for } => {
                assert_eq!(data(&partial), vec!["Email"]);
                assert_eq!(waiting_for.into_iter().collect::<Vec<_>>(), vec![f.clone()]);
            }
            other => panic!("expected pending, got {other:?}"),
        }
        assert_eq!(s.wait_list().len(), 1);
        assert!(s.sink().latest(&u1.name).is_none());

        let outcome = s.ingest(&UnitFacts::new(
            format!("{WEB}.Address"),
            vec![MethodFacts::new(f).category("Address")],
        ));
        assert_eq!(outcome.retried.len(), 1);
        assert!(s.wait_list().is_empty());
        assert_eq!(data(s.sink().latest(&u1.name).unwrap()), vec!["Address", "Email"]);
        assert_eq!(s.stats().retries, 1);
    }

    #[test]
    fn test_retry_can_defer_again() {
        let mut s = session();
        let (f, g) = (id("F", "f"), id("G", "g"));
        let name = format!("{WEB}.Ctrl");
        s.ingest(&UnitFacts::new(
            name.clone(),
            vec![MethodFacts::new(id("Ctrl", "get")).entry().calls(f.clone())],
        ));
        let outcome = s.ingest(&UnitFacts::new(
            format!("{WEB}.F"),
            vec![MethodFacts::new(f).category("Email").calls(g.clone())],
        ));

        assert!(!outcome.retried[0].1.is_finalized());
        assert_eq!(s.wait_list().get(&name).unwrap().waiting_for, BTreeSet::from([g.clone()]));

        s.ingest(&UnitFacts::new(
            format!("{WEB}.G"),
            vec![MethodFacts::new(g).category("Phone")],
        ));
        assert_eq!(data(s.sink().latest(&name).unwrap()), vec!["Email", "Phone"]);
    }

    #[test]
    fn test_interface_implementation_unblocks_waiter() {
        let mut s = session();
        let iface = id("Repo", "save");
        let name = format!("{WEB}.Ctrl");
        s.ingest(&UnitFacts::new(
            name.clone(),
            vec![MethodFacts::new(id("Ctrl", "save")).entry().calls(iface.clone())],
        ));
        assert_eq!(s.wait_list().len(), 1);

        s.ingest(&UnitFacts::new(
            format!("{WEB}.SqlRepo"),
            vec![MethodFacts::new(id("SqlRepo", "save"))
                .category("Address")
                .implementing(iface)],
        ));
        assert!(s.wait_list().is_empty());
        assert_eq!(data(s.sink().latest(&name).unwrap()), vec!["Address"]);
    }

    fn three_hops_outside(external: &MethodIdentity) -> UnitFacts {
        let (a, b) = (id("A", "a"), id("B", "b"));
        UnitFacts::new(
            format!("{WEB}.Ctrl"),
            vec![
                MethodFacts::new(id("Ctrl", "get")).entry().category("Email").calls(a.clone()),
                MethodFacts::new(a).calls(b.clone()),
                MethodFacts::new(b).calls(external.clone()),
            ],
        )
    }

    #[test]
    fn test_out_of_scope_dependency_stays_unresolved() {
        let mut s = session();
        let external = MethodIdentity::new("org.other.lib.pkg.Ext", "m", Vec::<String>::new());
        let unit = three_hops_outside(&external);

        let outcome = s.ingest(&unit);
        match outcome.resolution.unwrap() {
            Resolution::Blocked { partial, out_of_scope } => {
                assert_eq!(data(&partial), vec!["Email"]);
                assert_eq!(out_of_scope, BTreeSet::from([external.clone()]));
            }
            other => panic!("expected blocked, got {other:?}"),
        }
        assert!(s.sink().reports.is_empty());
        assert!(s.wait_list().is_empty());
        assert_eq!(s.blocked().count(), 1);

        // Never retried, even if the method shows up later.
        let outcome = s.ingest(&UnitFacts::new(
            "org.other.lib.pkg.Ext",
            vec![MethodFacts::new(external.clone()).category("Phone")],
        ));
        assert!(outcome.retried.is_empty());
        assert!(s.sink().reports.is_empty());

        let summary = s.finish();
        assert!(summary.unresolved.is_empty());
        assert_eq!(summary.out_of_scope.len(), 1);
        assert_eq!(summary.out_of_scope[0].name, unit.name);
        assert_eq!(summary.stats.write_failures, 0);
        assert!(s.sink().reports.is_empty());
    }

    #[test]
    fn test_out_of_scope_partial_written_when_configured() {
        let config = AnalysisConfig {
            emit_partial_on_finish: true,
            ..AnalysisConfig::default()
        };
        let mut s = Session::new(config, MemorySink::new());
        let external = MethodIdentity::new("org.other.lib.pkg.Ext", "m", Vec::<String>::new());
        let unit = three_hops_outside(&external);
        s.ingest(&unit);

        let summary = s.finish();
        assert_eq!(summary.partial_reports_written, 1);
        assert_eq!(data(s.sink().latest(&unit.name).unwrap()), vec!["Email"]);
        assert_eq!(s.blocked().count(), 0);
    }

    #[test]
    fn test_shared_transfer_appears_once() {
        let mut s = session();
        let t = Transfer::new("stripe", "https://stripe.com/privacy");
        let (pay, left, right) = (id("Billing", "charge"), id("Cart", "left"), id("Cart", "right"));
        let name = format!("{WEB}.Ctrl");
        s.ingest(&UnitFacts::new(
            name.clone(),
            vec![
                MethodFacts::new(pay.clone()).transfer(t.clone()),
                MethodFacts::new(left.clone()).calls(pay.clone()),
                MethodFacts::new(right.clone()).calls(pay),
                MethodFacts::new(id("Ctrl", "buy")).entry().calls(left).calls(right),
            ],
        ));
        assert_eq!(s.sink().latest(&name).unwrap().transfers, vec![t]);
    }

    #[test]
    fn test_test_units_and_abstract_methods_skipped() {
        let mut s = session();
        let outcome = s.ingest(&UnitFacts::new(
            format!("{WEB}.CtrlTest"),
            vec![MethodFacts::new(id("CtrlTest", "run")).entry()],
        ));
        assert!(outcome.skipped);

        s.ingest(&UnitFacts::new(
            format!("{WEB}.Repo"),
            vec![MethodFacts::new(id("Repo", "save")).abstract_decl()],
        ));
        assert!(s.registry().is_empty());
        assert_eq!(s.stats().units_skipped, 1);
        assert_eq!(s.stats().abstract_skipped, 1);
    }

    #[test]
    fn test_finish_is_fail_open_by_default() {
        let mut s = session();
        let name = format!("{WEB}.Ctrl");
        s.ingest(&UnitFacts::new(
            name.clone(),
            vec![MethodFacts::new(id("Ctrl", "get")).entry().calls(id("Never", "m"))],
        ));

        let summary = s.finish();
        assert_eq!(summary.unresolved.len(), 1);
        assert_eq!(summary.unresolved[0].name, name);
        assert_eq!(summary.partial_reports_written, 0);
        assert!(s.sink().reports.is_empty());
        assert!(s.wait_list().is_empty());
    }

    #[test]
    fn test_finish_emits_partial_when_configured() {
        let config = AnalysisConfig {
            emit_partial_on_finish: true,
            ..AnalysisConfig::default()
        };
        let mut s = Session::new(config, MemorySink::new());
        let name = format!("{WEB}.Ctrl");
        s.ingest(&UnitFacts::new(
            name.clone(),
            vec![MethodFacts::new(id("Ctrl", "get"))
                .entry()
                .category("Email")
                .calls(id("Never", "m"))],
        ));

        let summary = s.finish();
        assert_eq!(summary.partial_reports_written, 1);
        assert_eq!(data(s.sink().latest(&name).unwrap()), vec!["Email"]);
    }

    #[test]
    fn test_write_failure_does_not_abort_session() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let sink = DirectorySink::new(blocker.path().join("reports"));
        let mut s = Session::new(AnalysisConfig::default(), sink);

        for owner in ["Ctrl", "Other"] {
            s.ingest(&UnitFacts::new(
                format!("{WEB}.{owner}"),
                vec![MethodFacts::new(id(owner, "get")).entry().category("Email")],
            ));
        }
        assert_eq!(s.stats().write_failures, 2);
        assert_eq!(s.stats().units_seen, 2);
        assert_eq!(s.registry().len(), 2);
    }
}

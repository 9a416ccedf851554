use std::sync::Arc;

use super::*;
use crate::cache::{CacheBuilder, DepType, PackageFile};
use crate::collector::ErrorCollector;
use crate::config::Config;
use crate::index::{IndexEntry, LoadedIndex, StatusEntry};
use crate::policy::Policy;
use crate::progress::{NoProgress, Phase, ProgressSink};

fn pkg(name: &str, version: &str) -> IndexEntry {
    IndexEntry::new(name, version, "amd64")
}

fn pkg_with(name: &str, version: &str, dep_type: DepType, field: &str) -> IndexEntry {
    pkg(name, version).with_relations(dep_type, field).unwrap()
}

fn depcache(repo: Vec<IndexEntry>, status: Vec<StatusEntry>) -> DepCache {
    depcache_with(Config::default(), repo, status)
}

fn depcache_with(config: Config, repo: Vec<IndexEntry>, status: Vec<StatusEntry>) -> DepCache {
    let cache = CacheBuilder::new(&config)
        .with_index(LoadedIndex::new(PackageFile::repository("stable"), repo))
        .with_status(PackageFile::status(), status)
        .build(&mut ErrorCollector::new())
        .unwrap();
    let policy = Policy::new(&cache, &config);
    DepCache::new(Arc::new(cache), policy, &config)
}

fn id(dc: &DepCache, name: &str) -> PkgId {
    dc.cache().find_package(name, None).unwrap().id
}

/// Remembers every progress report
#[derive(Default)]
struct Recorder {
    reports: Vec<(Phase, f32)>,
}

impl ProgressSink for Recorder {
    fn progress(&mut self, phase: Phase, percent: f32) {
        self.reports.push((phase, percent));
    }
}

impl Recorder {
    fn assert_well_formed(&self) {
        assert!(!self.reports.is_empty());
        assert!(self.reports.iter().all(|&(phase, _)| phase == Phase::Resolve));
        assert!(self.reports.iter().all(|&(_, p)| (0.0..=100.0).contains(&p)));
        assert!(self.reports.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(self.reports.last().map(|&(_, p)| p), Some(100.0));
    }
}

fn unsatisfiable(result: Result<()>) -> ProblemSet {
    match result {
        Err(CacheError::Unsatisfiable(problems)) => problems,
        other => panic!("expected unsatisfiable, got {:?}", other),
    }
}

#[test]
fn test_nothing_broken() {
    let mut dc = depcache(vec![pkg("foo", "1.0")], vec![StatusEntry::installed(pkg("foo", "1.0"))]);
    let before = dc.snapshot();

    ProblemResolver::new(&mut dc).resolve(true, &mut NoProgress).unwrap();
    assert!(dc.states_equal(&before));
}

#[test]
fn test_score() {
    let mut dc = depcache(
        vec![
            pkg("base", "1.0").essential(true).priority(PriorityClass::Required),
            pkg_with("app", "1.0", DepType::Depends, "base"),
            pkg_with("tool", "1.0", DepType::Recommends, "base"),
            pkg("new", "1.0").priority(PriorityClass::Standard),
        ],
        vec![
            StatusEntry::installed(pkg("base", "1.0").essential(true).priority(PriorityClass::Required)),
            StatusEntry::installed(pkg_with("app", "1.0", DepType::Depends, "base")),
        ],
    );
    let (base, app, tool, new) = (id(&dc, "base"), id(&dc, "app"), id(&dc, "tool"), id(&dc, "new"));
    dc.mark_install(new, false, true);

    let mut resolver = ProblemResolver::new(&mut dc);
    // class + installed + essential + one hard reverse dependency
    assert_eq!(resolver.score(base), 3 + SCORE_INSTALLED + SCORE_ESSENTIAL + 1);
    assert_eq!(resolver.score(app), -1 + SCORE_INSTALLED);
    assert_eq!(resolver.score(tool), -1);
    assert_eq!(resolver.score(new), 1 + SCORE_EXPLICIT);

    resolver.protect(tool);
    assert_eq!(resolver.score(tool), -1 + SCORE_PROTECTED);
    resolver.clear(tool);
    assert_eq!(resolver.score(tool), -1);
}

#[test]
fn test_score_counts_reverse_dependencies_on_provides() {
    let mut dc = depcache(
        vec![
            pkg("postfix", "1.0").with_provides("mail-transport-agent").unwrap(),
            pkg_with("mailer", "1.0", DepType::Depends, "mail-transport-agent"),
        ],
        vec![],
    );
    let (postfix, mailer) = (id(&dc, "postfix"), id(&dc, "mailer"));
    assert_eq!(ProblemResolver::new(&mut dc).score(postfix), -1);

    dc.mark_install(mailer, true, true);
    assert!(dc.marked_install(postfix));
    assert_eq!(ProblemResolver::new(&mut dc).score(postfix), -1 + 1);
}

#[test]
fn test_installs_missing_dependency() {
    let mut dc = depcache(
        vec![pkg("b", "1.0"), pkg("a", "1.0"), pkg_with("foo", "1.0", DepType::Depends, "a | b")],
        vec![],
    );
    let foo = id(&dc, "foo");
    dc.mark_install(foo, false, true);
    assert!(dc.is_inst_broken(foo));

    ProblemResolver::new(&mut dc).resolve(false, &mut NoProgress).unwrap();
    assert!(dc.marked_install(foo));
    assert!(dc.marked_install(id(&dc, "a")));
    assert!(!dc.marked_install(id(&dc, "b")));
    assert_eq!(dc.broken_count(), 0);
}

#[test]
fn test_conflicting_requests_keep_one() {
    let mut dc = depcache(
        vec![pkg_with("a", "1.0", DepType::Conflicts, "b"), pkg("b", "1.0")],
        vec![],
    );
    let (a, b) = (id(&dc, "a"), id(&dc, "b"));
    {
        let mut group = dc.action_group();
        group.mark_install(a, false, true);
        group.mark_install(b, false, true);
    }
    assert_eq!(dc.broken_count(), 1);

    ProblemResolver::new(&mut dc).resolve(true, &mut NoProgress).unwrap();
    assert_eq!(dc.install_count(), 1);
    assert!(dc.marked_install(a) != dc.marked_install(b));
    assert_eq!(dc.broken_count(), 0);
}

#[test]
fn test_conflict_removes_lower_scored_side() {
    let mut dc = depcache(
        vec![
            pkg("x", "1.0"),
            pkg_with("y", "1.0", DepType::Depends, "x"),
            pkg_with("z", "1.0", DepType::Conflicts, "x"),
        ],
        vec![
            StatusEntry::installed(pkg("x", "1.0")),
            StatusEntry::installed(pkg_with("y", "1.0", DepType::Depends, "x")),
        ],
    );
    let (x, y, z) = (id(&dc, "x"), id(&dc, "y"), id(&dc, "z"));
    dc.mark_install(z, false, true);

    ProblemResolver::new(&mut dc).resolve(false, &mut NoProgress).unwrap();
    assert!(dc.marked_install(z));
    assert!(dc.marked_delete(x));
    // reinstalling x would break z again, so its dependent goes too
    assert!(dc.marked_delete(y));
    assert_eq!(dc.broken_count(), 0);
}

#[test]
fn test_protected_package_is_never_changed() {
    let mut dc = depcache(
        vec![pkg_with("a", "1.0", DepType::Conflicts, "b"), pkg("b", "1.0")],
        vec![],
    );
    let (a, b) = (id(&dc, "a"), id(&dc, "b"));
    {
        let mut group = dc.action_group();
        group.mark_install(a, false, true);
        group.mark_install(b, false, true);
    }

    let mut resolver = ProblemResolver::new(&mut dc);
    resolver.protect(a);
    resolver.resolve(false, &mut NoProgress).unwrap();

    assert!(dc.marked_install(a));
    assert!(dc.marked_keep(b));
}

#[test]
fn test_protected_conflict() {
    let mut dc = depcache(
        vec![pkg_with("a", "1.0", DepType::Conflicts, "b"), pkg("b", "1.0")],
        vec![],
    );
    let (a, b) = (id(&dc, "a"), id(&dc, "b"));
    {
        let mut group = dc.action_group();
        group.mark_install(a, false, true);
        group.mark_install(b, false, true);
    }

    let mut resolver = ProblemResolver::new(&mut dc);
    resolver.protect(a);
    resolver.protect(b);
    let problems = unsatisfiable(resolver.resolve(true, &mut NoProgress));

    assert!(problems.has_protected_conflict());
    assert_eq!(problems.packages(), vec![a]);
    assert_eq!(problems.problems()[0].kind, ProblemKind::ProtectedConflict { with: "b".into() });
    assert!(dc.marked_install(a));
    assert!(dc.marked_install(b));
}

#[test]
fn test_protected_missing_dependency() {
    let mut dc = depcache(vec![pkg_with("foo", "1.0", DepType::Depends, "ghost (>= 2)")], vec![]);
    let foo = id(&dc, "foo");
    dc.mark_install(foo, true, true);

    let mut resolver = ProblemResolver::new(&mut dc);
    resolver.protect(foo);
    let err = resolver.resolve(true, &mut NoProgress).unwrap_err();
    assert!(err.to_string().contains(" foo : Depends: ghost (>= 2) but it is not going to be installed"));

    let problems = unsatisfiable(Err(err));
    assert_eq!(problems.len(), 1);
    assert_eq!(
        problems.problems()[0].kind,
        ProblemKind::MissingDependency { dependency: "Depends: ghost (>= 2)".into() }
    );
    assert!(!problems.hit_iteration_cap());
    assert!(dc.marked_install(foo));
}

#[test]
fn test_unprotected_missing_dependency_is_dropped() {
    let mut dc = depcache(vec![pkg_with("foo", "1.0", DepType::Depends, "ghost")], vec![]);
    let foo = id(&dc, "foo");
    dc.mark_install(foo, true, true);

    ProblemResolver::new(&mut dc).resolve(false, &mut NoProgress).unwrap();
    assert!(dc.marked_keep(foo));
}

#[test]
fn test_iteration_cap() {
    let repo = || {
        vec![
            pkg_with("stuck", "1.0", DepType::Depends, "ghost"),
            pkg_with("fixable", "1.0", DepType::Depends, "lib"),
            pkg("lib", "1.0"),
        ]
    };
    let setup = |dc: &mut DepCache| {
        let (stuck, fixable) = (id(dc, "stuck"), id(dc, "fixable"));
        dc.mark_install(stuck, false, true);
        dc.mark_install(fixable, false, true);
        stuck
    };

    // one pass fixes `fixable` but cannot confirm the result is stable
    let mut dc = depcache(repo(), vec![]);
    let stuck = setup(&mut dc);
    let mut resolver = ProblemResolver::new(&mut dc).max_passes(1);
    resolver.protect(stuck);
    let problems = unsatisfiable(resolver.resolve(false, &mut NoProgress));
    assert!(problems.hit_iteration_cap());
    assert_eq!(problems.problems()[0].kind, ProblemKind::IterationCap { passes: 1 });
    assert_eq!(problems.packages(), vec![stuck]);

    let mut dc = depcache(repo(), vec![]);
    let stuck = setup(&mut dc);
    let mut resolver = ProblemResolver::new(&mut dc);
    resolver.protect(stuck);
    let problems = unsatisfiable(resolver.resolve(false, &mut NoProgress));
    assert!(!problems.hit_iteration_cap());
    assert!(dc.marked_install(id(&dc, "lib")));
}

#[test]
fn test_fix_broken_after_resolution() {
    let mut dc = depcache(
        vec![pkg("libfoo", "1.0"), pkg_with("foo", "1.0", DepType::Depends, "libfoo")],
        vec![],
    );
    let foo = id(&dc, "foo");
    dc.mark_install(foo, false, true);

    ProblemResolver::new(&mut dc).resolve(true, &mut NoProgress).unwrap();
    assert!(dc.marked_install(id(&dc, "libfoo")));
    assert!(!dc.is_inst_broken(foo));
}

fn or_group_over_essential(from_user: bool) -> (DepCache, PkgId) {
    let base = || pkg("base", "1.0").essential(true).priority(PriorityClass::Required);
    let mut dc = depcache(
        vec![
            base(),
            pkg_with("a", "1.0", DepType::Conflicts, "base"),
            pkg("b", "1.0"),
            pkg_with("x", "1.0", DepType::Depends, "a | b"),
        ],
        vec![StatusEntry::installed(base())],
    );
    let x = id(&dc, "x");
    dc.mark_install(x, false, from_user);
    (dc, x)
}

#[test]
fn test_alternative_never_removes_essential() {
    let (mut dc, x) = or_group_over_essential(true);

    ProblemResolver::new(&mut dc).resolve(true, &mut NoProgress).unwrap();
    assert!(dc.marked_keep(id(&dc, "base")));
    assert!(!dc.marked_install(id(&dc, "a")));
    assert!(dc.marked_install(id(&dc, "b")));
    assert!(dc.marked_install(x));
    assert_eq!(dc.delete_count(), 0);
}

#[test]
fn test_alternative_skips_removal_of_higher_scored() {
    let repo = || {
        vec![
            pkg("lib", "1.0"),
            pkg_with("a", "1.0", DepType::Conflicts, "lib"),
            pkg("b", "1.0"),
            pkg_with("x", "1.0", DepType::Depends, "a | b"),
        ]
    };
    let status = || vec![StatusEntry::installed(pkg("lib", "1.0"))];

    // an automatic x scores below the installed lib
    let mut dc = depcache(repo(), status());
    let x = id(&dc, "x");
    dc.mark_install(x, false, false);
    ProblemResolver::new(&mut dc).resolve(false, &mut NoProgress).unwrap();
    assert!(dc.marked_keep(id(&dc, "lib")));
    assert!(dc.marked_install(id(&dc, "b")));

    // an explicit x outranks it, so declared order wins
    let mut dc = depcache(repo(), status());
    let x = id(&dc, "x");
    dc.mark_install(x, false, true);
    ProblemResolver::new(&mut dc).resolve(false, &mut NoProgress).unwrap();
    assert!(dc.marked_delete(id(&dc, "lib")));
    assert!(dc.marked_install(id(&dc, "a")));
    assert!(!dc.marked_install(id(&dc, "b")));
}

#[test]
fn test_zero_passes_still_resolves() {
    let config = Config { resolver_max_passes: 0, ..Config::default() };
    let mut dc = depcache_with(
        config,
        vec![pkg("libfoo", "1.0"), pkg_with("foo", "1.0", DepType::Depends, "libfoo")],
        vec![],
    );
    let foo = id(&dc, "foo");
    dc.mark_install(foo, false, true);

    ProblemResolver::new(&mut dc).resolve(false, &mut NoProgress).unwrap();
    assert!(dc.marked_install(id(&dc, "libfoo")));
    assert_eq!(dc.broken_count(), 0);
}

#[test]
fn test_progress_reports() {
    // settles on the first pass
    let (mut dc, _) = or_group_over_essential(true);
    let mut recorder = Recorder::default();
    ProblemResolver::new(&mut dc).resolve(true, &mut recorder).unwrap();
    recorder.assert_well_formed();

    // two passes, then gives up on a protected package
    let mut dc = depcache(
        vec![
            pkg_with("stuck", "1.0", DepType::Depends, "ghost"),
            pkg_with("fixable", "1.0", DepType::Depends, "lib"),
            pkg("lib", "1.0"),
        ],
        vec![],
    );
    let (stuck, fixable) = (id(&dc, "stuck"), id(&dc, "fixable"));
    dc.mark_install(stuck, false, true);
    dc.mark_install(fixable, false, true);
    let mut recorder = Recorder::default();
    let mut resolver = ProblemResolver::new(&mut dc);
    resolver.protect(stuck);
    assert!(resolver.resolve(false, &mut recorder).is_err());
    recorder.assert_well_formed();
    let count = dc.cache().package_count();
    // one report per package and pass, plus the final one
    assert_eq!(recorder.reports.len(), 2 * count + 1);
    assert!(recorder.reports[count - 1].1 < 100.0);
}

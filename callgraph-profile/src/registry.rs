use crate::config::Config;
use crate::record::{Record, RecordId};

use std::borrow::Cow;
use std::collections::BTreeMap;

/// Prefix of records opened while a record of the same name is already active.
pub const RECURSION_MARKER: &str = "RECURSIVE@";

/// Aggregation strategy of a [Registry](./struct.Registry.html).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One record per name, nesting is ignored.
    Flat,
    /// One record per call path.
    CallGraph,
}

/// Order in which sibling records are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Lexicographic by name.
    ByName,
    /// In the order the records were first entered.
    FirstCall,
}

impl Default for Order {
    fn default() -> Self {
        Order::ByName
    }
}

/// Owns every record of one thread and tracks which of them are active.
///
/// Records are stored in an arena and referenced by [RecordId](./struct.RecordId.html);
/// the root map and the children maps of call-graph records form the tree.
/// Nothing is ever removed.
#[derive(Debug)]
pub struct Registry {
    mode: Mode,
    order: Order,
    omit_recursive_calls: bool,
    records: Vec<Record>,
    roots: BTreeMap<String, RecordId>,
    stack: Vec<RecordId>,
}

impl Registry {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            order: Order::default(),
            omit_recursive_calls: true,
            records: Vec::new(),
            roots: BTreeMap::new(),
            stack: Vec::new(),
        }
    }

    pub fn with_config(mode: Mode, config: &Config) -> Self {
        let mut res = Self::new(mode);
        res.order = config.order;
        res.omit_recursive_calls = config.omit_recursive_calls;
        res
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn set_order(&mut self, order: Order) {
        self.order = order;
    }

    pub fn omit_recursive_calls(&self) -> bool {
        self.omit_recursive_calls
    }

    /// Only affects activations entered after the call.
    pub fn set_omit_recursive_calls(&mut self, omit: bool) {
        self.omit_recursive_calls = omit;
    }

    /// Find or create the record `name` at the current position.
    ///
    /// The position is the root level in flat mode or when nothing is active,
    /// otherwise the children of the innermost active record.
    pub fn resolve(&mut self, name: &str) -> RecordId {
        let next = RecordId(self.records.len());
        let level = match (self.mode, self.stack.last().copied()) {
            (Mode::CallGraph, Some(top)) => self.records[top.0].children_mut(),
            _ => &mut self.roots,
        };
        if let Some(id) = level.get(name) {
            return *id;
        }
        level.insert(name.to_owned(), next);
        self.records.push(Record::new(name.to_owned()));
        next
    }

    pub fn push(&mut self, id: RecordId) {
        self.stack.push(id);
    }

    pub fn pop(&mut self) -> Option<RecordId> {
        self.stack.pop()
    }

    pub fn is_on_stack(&self, name: &str) -> bool {
        self.stack
            .iter()
            .any(|id| self.records[id.0].name() == name)
    }

    /// Number of active call-graph records.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Start an activation of `name`.
    ///
    /// Returns `None` if the activation is not measured: a reentrant flat
    /// record, or a recursive call-graph record while recursive calls are
    /// omitted.
    pub fn enter(&mut self, name: &str) -> Option<RecordId> {
        let name = if self.mode == Mode::CallGraph && self.is_on_stack(name) {
            if self.omit_recursive_calls {
                trace!("Omitting recursive call of {}", name);
                return None;
            }
            Cow::Owned(format!("{}{}", RECURSION_MARKER, name))
        } else {
            Cow::Borrowed(name)
        };

        let id = self.resolve(&name);
        if !self.records[id.0].start(self.mode) {
            trace!("{} is already running", name);
            return None;
        }
        if self.mode == Mode::CallGraph {
            self.push(id);
        }
        Some(id)
    }

    /// Finish an activation started by [enter](#method.enter).
    pub fn exit(&mut self, id: RecordId) {
        let mode = self.mode;
        match self.records.get_mut(id.0) {
            Some(record) => {
                record.stop(mode);
            }
            None => {
                warn!("Stopping unknown record {:?}", id);
                return;
            }
        }
        if mode != Mode::CallGraph {
            return;
        }
        match self.stack.iter().rposition(|x| *x == id) {
            Some(pos) if pos + 1 == self.stack.len() => {
                self.pop();
            }
            Some(pos) => {
                warn!(
                    "Record {} stopped while inner records are still active",
                    self.records[id.0].name()
                );
                self.stack.remove(pos);
            }
            None => {
                warn!(
                    "Record {} stopped but it is not active",
                    self.records[id.0].name()
                );
            }
        }
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Top level records in report order.
    pub fn roots(&self) -> Vec<RecordId> {
        self.ordered(&self.roots)
    }

    /// Children of `id` in report order.
    pub fn children(&self, id: RecordId) -> Vec<RecordId> {
        self.record(id)
            .map(|r| self.ordered(r.children()))
            .unwrap_or_default()
    }

    /// Look up a record by its call path, outermost name first.
    /// In flat mode the path is a single name.
    pub fn find(&self, path: &[&str]) -> Option<&Record> {
        let (first, rest) = path.split_first()?;
        let mut id = *self.roots.get(*first)?;
        for name in rest {
            id = *self.records[id.0].children().get(*name)?;
        }
        self.record(id)
    }

    fn ordered(&self, level: &BTreeMap<String, RecordId>) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = level.values().copied().collect();
        if self.order == Order::FirstCall {
            ids.sort_unstable();
        }
        ids
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn run(registry: &mut Registry, name: &str, inner: impl FnOnce(&mut Registry)) {
        let id = registry.enter(name);
        inner(registry);
        if let Some(id) = id {
            registry.exit(id);
        }
    }

    fn leaf(registry: &mut Registry, name: &str) {
        run(registry, name, |_| {});
    }

    fn g(registry: &mut Registry, n: u32) {
        run(registry, "g", |registry| {
            if n >= 2 {
                g(registry, n - 1);
            }
        });
    }

    fn h1(registry: &mut Registry, n: u32) {
        run(registry, "h1", |registry| {
            if n >= 2 {
                h2(registry, n - 1);
            }
        });
    }

    fn h2(registry: &mut Registry, n: u32) {
        run(registry, "h2", |registry| {
            if n >= 2 {
                h1(registry, n - 1);
            }
        });
    }

    fn count(registry: &Registry, path: &[&str]) -> u64 {
        registry
            .find(path)
            .map(|r| r.call_count())
            .unwrap_or_else(|| panic!("{:?} was not recorded", path))
    }

    /// Sum of the call counts of `name` and every marked record below it.
    fn chain_count(registry: &Registry, path: &[&str]) -> u64 {
        let marked = format!("{}{}", RECURSION_MARKER, path.last().unwrap());
        let mut path: Vec<&str> = path.to_vec();
        let mut total = 0;
        while let Some(r) = registry.find(&path) {
            total += r.call_count();
            path.push(marked.as_str());
        }
        total
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut registry = Registry::new(Mode::CallGraph);
        let a = registry.resolve("a");
        let b = registry.resolve("b");
        assert_ne!(a, b);
        assert_eq!(registry.resolve("a"), a);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn resolve_uses_stack_top_in_call_graph_mode() {
        let mut registry = Registry::new(Mode::CallGraph);
        let outer = registry.resolve("outer");
        registry.push(outer);
        let inner = registry.resolve("inner");
        assert_eq!(registry.children(outer), vec![inner]);
        assert!(registry.roots().iter().all(|id| *id != inner));
        registry.pop();
        assert_ne!(registry.resolve("inner"), inner);
    }

    #[test]
    fn flat_mode_ignores_stack() {
        let mut registry = Registry::new(Mode::Flat);
        run(&mut registry, "outer", |registry| {
            leaf(registry, "inner");
            assert_eq!(registry.depth(), 0);
        });
        assert_eq!(registry.roots().len(), 2);
        assert_eq!(count(&registry, &["inner"]), 1);
    }

    #[test]
    fn pop_on_empty_stack_is_noop() {
        let mut registry = Registry::new(Mode::CallGraph);
        assert_eq!(registry.pop(), None);
        assert_eq!(registry.depth(), 0);
    }

    #[test]
    fn nesting_mirrors_call_paths() {
        let mut registry = Registry::new(Mode::CallGraph);
        run(&mut registry, "main", |registry| {
            for _ in 0..2 {
                run(registry, "a", |registry| leaf(registry, "c"));
            }
            run(registry, "b", |registry| {
                leaf(registry, "c");
                leaf(registry, "c");
                leaf(registry, "c");
            });
        });

        assert_eq!(count(&registry, &["main"]), 1);
        assert_eq!(count(&registry, &["main", "a"]), 2);
        assert_eq!(count(&registry, &["main", "a", "c"]), 2);
        assert_eq!(count(&registry, &["main", "b"]), 1);
        assert_eq!(count(&registry, &["main", "b", "c"]), 3);
        assert!(registry.find(&["c"]).is_none());
        assert_eq!(registry.depth(), 0);
    }

    #[test]
    fn flat_repeated_calls_accumulate() {
        use std::time::{Duration, Instant};

        let mut registry = Registry::new(Mode::Flat);
        let mut outside = Duration::ZERO;
        for _ in 0..5 {
            let start = Instant::now();
            let id = registry.enter("f").unwrap();
            std::thread::sleep(Duration::from_millis(1));
            registry.exit(id);
            outside += start.elapsed();
        }
        let f = registry.find(&["f"]).unwrap();
        assert_eq!(f.call_count(), 5);
        assert!(f.wall_time() >= Duration::from_millis(5));
        assert!(f.wall_time() <= outside);
    }

    #[test]
    fn flat_recursion_counts_once() {
        let mut registry = Registry::new(Mode::Flat);
        g(&mut registry, 9);
        assert_eq!(count(&registry, &["g"]), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn flat_mutual_recursion_counts_once() {
        let mut registry = Registry::new(Mode::Flat);
        h1(&mut registry, 9);
        assert_eq!(count(&registry, &["h1"]), 1);
        assert_eq!(count(&registry, &["h2"]), 1);
    }

    #[test]
    fn omitted_recursion_is_a_single_node() {
        let mut registry = Registry::new(Mode::CallGraph);
        assert!(registry.omit_recursive_calls());
        g(&mut registry, 9);
        assert_eq!(count(&registry, &["g"]), 1);
        assert!(registry.children(registry.roots()[0]).is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn marked_recursion_sums_to_depth() {
        let mut registry = Registry::new(Mode::CallGraph);
        registry.set_omit_recursive_calls(false);
        g(&mut registry, 9);
        assert_eq!(count(&registry, &["g"]), 1);
        assert_eq!(count(&registry, &["g", "RECURSIVE@g"]), 1);
        assert_eq!(chain_count(&registry, &["g"]), 9);
    }

    #[test]
    fn omitted_mutual_recursion() {
        let mut registry = Registry::new(Mode::CallGraph);
        h1(&mut registry, 9);
        assert_eq!(count(&registry, &["h1"]), 1);
        assert_eq!(count(&registry, &["h1", "h2"]), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn marked_mutual_recursion() {
        let mut registry = Registry::new(Mode::CallGraph);
        registry.set_omit_recursive_calls(false);
        h1(&mut registry, 5);
        assert_eq!(count(&registry, &["h1"]), 1);
        assert_eq!(count(&registry, &["h1", "h2"]), 1);
        assert_eq!(count(&registry, &["h1", "h2", "RECURSIVE@h1"]), 1);
        assert_eq!(
            count(&registry, &["h1", "h2", "RECURSIVE@h1", "RECURSIVE@h2"]),
            1
        );
        assert_eq!(
            count(
                &registry,
                &["h1", "h2", "RECURSIVE@h1", "RECURSIVE@h2", "RECURSIVE@h1"]
            ),
            1
        );
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn calls_inside_omitted_activation_keep_their_ancestry() {
        let mut registry = Registry::new(Mode::CallGraph);
        run(&mut registry, "g", |registry| {
            run(registry, "g", |registry| leaf(registry, "f"));
        });
        assert_eq!(count(&registry, &["g"]), 1);
        assert_eq!(count(&registry, &["g", "f"]), 1);
    }

    #[test]
    fn toggling_only_affects_later_activations() {
        let mut registry = Registry::new(Mode::CallGraph);
        let outer = registry.enter("g").unwrap();
        assert_eq!(registry.enter("g"), None);

        registry.set_omit_recursive_calls(false);
        let inner = registry.enter("g").unwrap();
        registry.set_omit_recursive_calls(true);
        registry.exit(inner);
        registry.exit(outer);

        assert_eq!(count(&registry, &["g"]), 1);
        assert_eq!(count(&registry, &["g", "RECURSIVE@g"]), 1);
        assert_eq!(registry.depth(), 0);
    }

    #[test]
    fn out_of_order_exit_keeps_stack_consistent() {
        let mut registry = Registry::new(Mode::CallGraph);
        let a = registry.enter("a").unwrap();
        let b = registry.enter("b").unwrap();
        registry.exit(a);
        assert_eq!(registry.depth(), 1);
        assert!(registry.is_on_stack("b"));
        assert!(!registry.is_on_stack("a"));
        registry.exit(b);
        assert_eq!(registry.depth(), 0);
        assert_eq!(count(&registry, &["a", "b"]), 1);
    }

    #[test]
    fn first_call_order() {
        let mut registry = Registry::new(Mode::Flat);
        leaf(&mut registry, "zeta");
        leaf(&mut registry, "alpha");
        leaf(&mut registry, "mid");

        let names = |registry: &Registry| -> Vec<String> {
            registry
                .roots()
                .into_iter()
                .map(|id| registry.record(id).unwrap().name().to_owned())
                .collect()
        };

        assert_eq!(names(&registry), vec!["alpha", "mid", "zeta"]);
        registry.set_order(Order::FirstCall);
        assert_eq!(names(&registry), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn config_is_applied() {
        let config = Config {
            omit_recursive_calls: false,
            order: Order::FirstCall,
            ..Config::default()
        };
        let registry = Registry::with_config(Mode::CallGraph, &config);
        assert!(!registry.omit_recursive_calls());
        assert_eq!(registry.order(), Order::FirstCall);
    }
}

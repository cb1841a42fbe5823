use clap::ValueEnum;
use crafting_graph::ValidationPolicy;
use crafting_search::{BottomUpStrategy, Execution, SearchMode, TopDownStrategy, Traversal};

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum ModeFlag {
    TopDown,
    Bidirectional,
}

impl ModeFlag {
    pub(crate) const fn as_domain(self) -> SearchMode {
        match self {
            ModeFlag::TopDown => SearchMode::TopDown,
            ModeFlag::Bidirectional => SearchMode::Bidirectional,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum StrategyFlag {
    Multi,
    Single,
}

impl StrategyFlag {
    pub(crate) const fn as_domain(self) -> TopDownStrategy {
        match self {
            StrategyFlag::Multi => TopDownStrategy::MultiRecipe,
            StrategyFlag::Single => TopDownStrategy::SingleRecipe,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum TraversalFlag {
    Dfs,
    Bfs,
}

impl TraversalFlag {
    pub(crate) const fn as_domain(self) -> Traversal {
        match self {
            TraversalFlag::Dfs => Traversal::DepthFirst,
            TraversalFlag::Bfs => Traversal::BreadthFirst,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum ExecutionFlag {
    Sequential,
    Concurrent,
}

impl ExecutionFlag {
    pub(crate) const fn as_domain(self) -> Execution {
        match self {
            ExecutionFlag::Sequential => Execution::Sequential,
            ExecutionFlag::Concurrent => Execution::Concurrent,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum BottomUpFlag {
    Tiered,
    Dfs,
}

impl BottomUpFlag {
    pub(crate) const fn as_domain(self) -> BottomUpStrategy {
        match self {
            BottomUpFlag::Tiered => BottomUpStrategy::Tiered,
            BottomUpFlag::Dfs => BottomUpStrategy::DepthFirst,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum PolicyFlag {
    Warn,
    Reject,
}

impl PolicyFlag {
    pub(crate) const fn as_domain(self) -> ValidationPolicy {
        match self {
            PolicyFlag::Warn => ValidationPolicy::Warn,
            PolicyFlag::Reject => ValidationPolicy::Reject,
        }
    }
}

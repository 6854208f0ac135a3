// Aggregates all former standalone integration tests as modules.
mod history_viewport;
mod pointer;
mod session_loading;
mod split_pane_routing;
mod support;

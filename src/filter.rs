use crate::models::{FilterMode, Todo};

impl FilterMode {
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Active => !todo.completed,
            FilterMode::Completed => todo.completed,
        }
    }
}

/// Returns the entries visible under `mode`, in list order.
pub fn select(todos: &[Todo], mode: FilterMode) -> Vec<&Todo> {
    todos.iter().filter(|todo| mode.matches(todo)).collect()
}

/// `(active, completed)` counts.
pub fn counts(todos: &[Todo]) -> (usize, usize) {
    let completed = todos.iter().filter(|todo| todo.completed).count();
    (todos.len() - completed, completed)
}

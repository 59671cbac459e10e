mod arena;
mod walk;

pub use arena::DirArena;
pub use walk::{walk_roots, WalkOutcome, WalkedFile};

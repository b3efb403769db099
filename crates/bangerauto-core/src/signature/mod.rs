mod matcher;
mod pattern;

pub use matcher::SignatureMatcher;
pub use pattern::Pattern;

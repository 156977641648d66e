mod clean;
mod fields;
mod labels;
mod merge;
mod normalize;
mod segment;
#[cfg(test)]
mod tests;

pub use fields::RecordExtractor;
pub use merge::deduplicate;
pub use normalize::bengali_char_count;

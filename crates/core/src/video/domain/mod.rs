pub mod frame_source;

#[cfg(test)]
pub(crate) mod test_sources;

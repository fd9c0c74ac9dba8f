//! Format analyzers.
//!
//! Every analyzer has the same shape: a `matches` probe used by the
//! dispatcher and an `analyze` walk over a shared analysis context. None of
//! them returns an error; failures become fields.

pub mod elf;
pub mod png;
pub mod tar;
pub mod tiff;

/// Renders `value` with the names of the bits in `flags` that it sets,
/// followed by the unnamed remainder in hex
pub(crate) fn describe_flags(value: u64, flags: &[(u64, &str)]) -> String {
    let mut names: Vec<String> = flags
        .iter()
        .filter(|(bit, _)| value & bit != 0)
        .map(|(_, name)| (*name).to_string())
        .collect();
    let known = flags.iter().fold(0, |acc, (bit, _)| acc | bit);
    let unknown = value & !known;
    if unknown != 0 {
        names.push(format!("unknown 0x{unknown:x}"));
    }
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    }
}

/// Looks `value` up in a name table
pub(crate) fn lookup<T: PartialEq + Copy>(
    value: T,
    table: &[(T, &'static str)],
) -> Option<&'static str> {
    table
        .iter()
        .find(|(key, _)| *key == value)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_flags() {
        let flags = [(1, "Execute"), (2, "Write"), (4, "Read")];
        assert_eq!(describe_flags(5, &flags), "Execute, Read");
        assert_eq!(describe_flags(0, &flags), "None");
        assert_eq!(describe_flags(0x12, &flags), "Write, unknown 0x10");
    }

    #[test]
    fn test_lookup() {
        let table = [(1u8, "one"), (2, "two")];
        assert_eq!(lookup(2, &table), Some("two"));
        assert_eq!(lookup(3, &table), None);
    }
}

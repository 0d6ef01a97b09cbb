//! Deterministic default color for columns.
//!
//! A column created without an explicit color gets one from a fixed palette,
//! picked by hashing its name, so the same name always renders the same way
//! on every client.

/// Column header palette (6-char hex without `#`).
const PALETTE: &[&str] = &[
    "6b7280", // slate
    "2563eb", // blue
    "0891b2", // cyan
    "059669", // emerald
    "65a30d", // lime
    "ca8a04", // amber
    "ea580c", // orange
    "dc2626", // red
    "db2777", // pink
    "9333ea", // purple
    "4f46e5", // indigo
    "0d9488", // teal
];

/// Return the default color for a column name.
///
/// Uses FNV-1a over the lowercased, trimmed name so "Done" and " done " agree.
pub fn auto_color(name: &str) -> &'static str {
    let hash = fnv1a(&name.trim().to_lowercase());
    PALETTE[(hash as usize) % PALETTE.len()]
}

/// 32-bit FNV-1a; stable across platforms and releases, unlike `DefaultHasher`
fn fnv1a(s: &str) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    s.bytes()
        .fold(OFFSET_BASIS, |hash, byte| (hash ^ u32::from(byte)).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_color_deterministic() {
        assert_eq!(auto_color("In Review"), auto_color("In Review"));
    }

    #[test]
    fn test_auto_color_normalizes_name() {
        assert_eq!(auto_color("Done"), auto_color("  done "));
    }

    #[test]
    fn test_auto_color_valid_hex() {
        for name in &["To Do", "Doing", "Done", "Blocked", "QA", "Backlog"] {
            let color = auto_color(name);
            assert_eq!(color.len(), 6);
            assert!(color.chars().all(|c| c.is_ascii_hexdigit()));
            assert!(PALETTE.contains(&color));
        }
    }

    #[test]
    fn test_fnv1a_matches_reference_vectors() {
        assert_eq!(fnv1a(""), 0x811c_9dc5);
        assert_eq!(fnv1a("a"), 0xe40c_292c);
        assert_eq!(fnv1a("foobar"), 0xbf9c_f968);
    }
}

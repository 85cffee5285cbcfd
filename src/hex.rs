//! Hex dump of raw bytes.

/// Bytes per row.
const COLUMNS: usize = 16;

/// Bytes per group within a row.
const GROUP: usize = 4;

/// Width of the hex column: three characters per byte plus one per group.
const HEX_WIDTH: usize = COLUMNS * 3 + COLUMNS / GROUP;

/// Render `bytes` as a hex dump with offset ruler and ASCII column.
pub fn render(bytes: &[u8], eol: &str) -> String {
    let mut out = format!("{eol}Hex dump of {} byte:{eol}{eol}", bytes.len());

    let mut ruler = String::new();
    for i in 0..COLUMNS {
        ruler.push_str(&format!("{i:02x}"));
        ruler.push_str(group_gap(i));
    }
    out.push_str(&format!("{:10}{ruler}{eol}", ""));

    for (row, chunk) in bytes.chunks(COLUMNS).enumerate() {
        let mut hex = String::with_capacity(HEX_WIDTH);
        let mut ascii = String::with_capacity(COLUMNS + COLUMNS / GROUP);
        for (i, &byte) in chunk.iter().enumerate() {
            hex.push_str(&format!("{byte:02x}"));
            hex.push_str(group_gap(i));

            ascii.push(if is_printable(byte) { byte as char } else { '.' });
            if i % GROUP == GROUP - 1 {
                ascii.push(' ');
            }
        }
        out.push_str(&format!(
            "{:08x}  {hex:<HEX_WIDTH$}{ascii}{eol}",
            row * COLUMNS
        ));
    }
    out
}

fn group_gap(i: usize) -> &'static str {
    if i % GROUP == GROUP - 1 { "  " } else { " " }
}

fn is_printable(byte: u8) -> bool {
    (0x20..=0x7e).contains(&byte)
}

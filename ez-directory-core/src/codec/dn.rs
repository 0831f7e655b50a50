//! Distinguished-name fragments.

/// Split a DN into its raw components at unescaped commas.
pub fn split_dn(dn: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in dn.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ',' => {
                parts.push(dn[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < dn.len() {
        parts.push(dn[start..].trim());
    }
    parts
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Display name of the first DN component: the 3-character `CN=` style prefix is
/// stripped, the value ends at the first unescaped comma, and `\,` / `\2C` escapes are
/// resolved.
///
/// `CN=Doe\, Jane,OU=Staff,DC=corp` → `Doe, Jane`.
pub fn decode_rdn_value(dn: &str) -> String {
    let Some(rest) = dn.trim().get(3..) else {
        return String::new();
    };
    let bytes = rest.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b',' => break,
            b'\\' if i + 1 < bytes.len() => {
                let pair = bytes
                    .get(i + 2)
                    .and_then(|&lo| Some((hex_value(bytes[i + 1])?, hex_value(lo)?)));
                if let Some((hi, lo)) = pair {
                    out.push((hi << 4) | lo);
                    i += 3;
                } else {
                    out.push(bytes[i + 1]);
                    i += 2;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Decoded value of the DN component at `index`.
pub fn component_value(dn: &str, index: usize) -> Option<String> {
    split_dn(dn).get(index).map(|part| decode_rdn_value(part))
}

/// `corp.example.com` → `DC=corp,DC=example,DC=com`.
pub fn domain_to_dn(domain: &str) -> String {
    domain
        .split('.')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(|label| format!("DC={label}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// `DC=corp,DC=example,DC=com` → `corp.example.com`; non-`DC` components are skipped.
pub fn dn_to_domain(dn: &str) -> String {
    split_dn(dn)
        .into_iter()
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim().eq_ignore_ascii_case("DC").then(|| value.trim())
        })
        .collect::<Vec<_>>()
        .join(".")
}

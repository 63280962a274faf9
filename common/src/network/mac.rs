use pnet::util::MacAddr;

/// Renders a hardware address as upper-case colon hex (`AA:BB:CC:DD:EE:FF`).
///
/// `MacAddr`'s own `Display` is lower case.
pub fn to_colon_hex(mac: MacAddr) -> String {
    let MacAddr(a, b, c, d, e, f) = mac;
    format!("{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{f:02X}")
}

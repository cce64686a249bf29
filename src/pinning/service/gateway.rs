/// Gateways any pinned content identifier can be fetched from.
pub const PUBLIC_GATEWAYS: [&str; 2] = ["https://ipfs.io/ipfs/", "https://dweb.link/ipfs/"];

/// Links to `cid` on the service gateway first, then the public ones.
pub fn gateway_links(service_gateway: &str, cid: &str) -> Vec<String> {
  std::iter::once(service_gateway)
    .chain(PUBLIC_GATEWAYS)
    .map(|gateway| {
      if gateway.ends_with('/') {
        format!("{gateway}{cid}")
      } else {
        format!("{gateway}/{cid}")
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_gateway_links() {
    let cid = "bafkreigh2akiscaildcqabsyg3dfr6chu3fgpregiymsck7e7aqa4s52zy";
    assert_eq!(
      gateway_links("https://ipfs.pat.mn/ipfs", cid),
      vec![
        format!("https://ipfs.pat.mn/ipfs/{cid}"),
        format!("https://ipfs.io/ipfs/{cid}"),
        format!("https://dweb.link/ipfs/{cid}"),
      ]
    );
  }
}

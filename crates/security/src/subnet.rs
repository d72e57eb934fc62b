//! Trusted-subnet source filtering
//!
//! When a CIDR is configured, ingestion requests must carry an `X-Real-IP`
//! header whose address falls inside it. A missing, unparsable, or
//! out-of-subnet address is rejected before the request reaches any handler.

use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;

use crate::SecurityError;

/// Header naming the caller's source address.
pub const REAL_IP_HEADER: &str = "X-Real-IP";

/// A parsed CIDR range of permitted source addresses.
#[derive(Debug, Clone)]
pub struct TrustedSubnet {
	net: IpNet,
}

impl TrustedSubnet {
	pub fn parse(cidr: &str) -> Result<Self, SecurityError> {
		let net = IpNet::from_str(cidr).map_err(|err| {
			SecurityError::SubnetRejected(format!("invalid trusted subnet {cidr}: {err}"))
		})?;
		Ok(Self { net })
	}

	/// Check a header value against the subnet.
	pub fn check(&self, header: Option<&str>) -> Result<(), SecurityError> {
		let raw = header.ok_or_else(|| {
			SecurityError::SubnetRejected(format!("{REAL_IP_HEADER} header is not found"))
		})?;
		let addr = IpAddr::from_str(raw.trim()).map_err(|_| {
			SecurityError::SubnetRejected(format!("cannot parse source address {raw}"))
		})?;
		if self.net.contains(&addr) {
			Ok(())
		} else {
			Err(SecurityError::SubnetRejected(format!(
				"{addr} is outside the trusted subnet"
			)))
		}
	}
}

//! CloudFront distributions
//!
//! Only the subset of distribution settings a bucket-backed static site
//! needs: origins, one default cache behavior, geo restrictions, a viewer
//! certificate and custom error responses.

use super::Resource;
use sitestack_kernel::output::Output;
use sitestack_kernel::property::{IntoProperty, PropertyMap, PropertyValue};
use std::fmt::{self, Display, Formatter};

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl IntoProperty for $name {
            fn into_property(self) -> PropertyValue {
                PropertyValue::String(self.as_str().to_string())
            }
        }
    };
}

wire_enum!(
    /// HTTP methods CloudFront can allow or cache
    HttpMethod {
        Get => "GET",
        Head => "HEAD",
        Options => "OPTIONS",
        Put => "PUT",
        Post => "POST",
        Patch => "PATCH",
        Delete => "DELETE",
    }
);

wire_enum!(
    ViewerProtocolPolicy {
        AllowAll => "allow-all",
        HttpsOnly => "https-only",
        RedirectToHttps => "redirect-to-https",
    }
);

wire_enum!(
    /// Edge locations the distribution is served from
    PriceClass {
        NorthAmericaEurope => "PriceClass_100",
        MostRegions => "PriceClass_200",
        All => "PriceClass_All",
    }
);

wire_enum!(
    CookieForwarding {
        None => "none",
        All => "all",
        Whitelist => "whitelist",
    }
);

/// Read-only methods: GET, HEAD, OPTIONS
pub const READ_ONLY_METHODS: [HttpMethod; 3] =
    [HttpMethod::Get, HttpMethod::Head, HttpMethod::Options];

/// An origin the distribution fetches from
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    pub origin_id: Output<String>,
    pub domain_name: Output<String>,
}

impl IntoProperty for Origin {
    fn into_property(self) -> PropertyValue {
        PropertyMap::new()
            .with("originId", self.origin_id)
            .with("domainName", self.domain_name)
            .into_property()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedValues {
    pub query_string: bool,
    pub cookies: CookieForwarding,
}

impl ForwardedValues {
    /// Forward neither cookies nor query strings
    #[must_use]
    pub fn none() -> Self {
        Self {
            query_string: false,
            cookies: CookieForwarding::None,
        }
    }
}

impl IntoProperty for ForwardedValues {
    fn into_property(self) -> PropertyValue {
        PropertyMap::new()
            .with("cookies", PropertyMap::new().with("forward", self.cookies))
            .with("queryString", self.query_string)
            .into_property()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheBehavior {
    pub target_origin_id: Output<String>,
    pub allowed_methods: Vec<HttpMethod>,
    pub cached_methods: Vec<HttpMethod>,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub forwarded_values: ForwardedValues,
}

impl CacheBehavior {
    /// Read-only, HTTPS-redirecting behavior with nothing forwarded
    #[must_use]
    pub fn static_content(target_origin_id: Output<String>) -> Self {
        Self {
            target_origin_id,
            allowed_methods: READ_ONLY_METHODS.to_vec(),
            cached_methods: READ_ONLY_METHODS.to_vec(),
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            forwarded_values: ForwardedValues::none(),
        }
    }
}

impl IntoProperty for CacheBehavior {
    fn into_property(self) -> PropertyValue {
        PropertyMap::new()
            .with("targetOriginId", self.target_origin_id)
            .with("allowedMethods", self.allowed_methods)
            .with("cachedMethods", self.cached_methods)
            .with("viewerProtocolPolicy", self.viewer_protocol_policy)
            .with("forwardedValues", self.forwarded_values)
            .into_property()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoRestriction {
    /// `none`, `whitelist` or `blacklist`
    pub restriction_type: String,
    pub locations: Vec<String>,
}

impl GeoRestriction {
    #[must_use]
    pub fn unrestricted() -> Self {
        Self {
            restriction_type: "none".to_string(),
            locations: Vec::new(),
        }
    }
}

impl IntoProperty for GeoRestriction {
    fn into_property(self) -> PropertyValue {
        let locations = (!self.locations.is_empty()).then_some(self.locations);
        PropertyMap::new()
            .with(
                "geoRestriction",
                PropertyMap::new()
                    .with("restrictionType", self.restriction_type)
                    .with_opt("locations", locations),
            )
            .into_property()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerCertificate {
    pub acm_certificate_arn: Output<String>,
    pub ssl_support_method: String,
}

impl ViewerCertificate {
    /// ACM certificate served via SNI
    #[must_use]
    pub fn sni(acm_certificate_arn: Output<String>) -> Self {
        Self {
            acm_certificate_arn,
            ssl_support_method: "sni-only".to_string(),
        }
    }
}

impl IntoProperty for ViewerCertificate {
    fn into_property(self) -> PropertyValue {
        PropertyMap::new()
            .with("acmCertificateArn", self.acm_certificate_arn)
            .with("sslSupportMethod", self.ssl_support_method)
            .into_property()
    }
}

/// Rewrite of an origin error status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomErrorResponse {
    pub error_code: u16,
    pub response_code: u16,
    pub response_page_path: String,
    pub error_caching_min_ttl: u64,
}

impl CustomErrorResponse {
    /// Serve `page` with 200 in place of `error_code`, for client-side routing
    pub fn fallback_to(error_code: u16, page: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            error_code,
            response_code: 200,
            response_page_path: page.into(),
            error_caching_min_ttl: ttl_secs,
        }
    }
}

impl IntoProperty for CustomErrorResponse {
    fn into_property(self) -> PropertyValue {
        PropertyMap::new()
            .with("errorCode", self.error_code)
            .with("responseCode", self.response_code)
            .with("responsePagePath", self.response_page_path)
            .with("errorCachingMinTtl", self.error_caching_min_ttl)
            .into_property()
    }
}

/// `aws:cloudfront/distribution:Distribution`
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionArgs {
    pub enabled: bool,
    pub aliases: Vec<Output<String>>,
    pub origins: Vec<Origin>,
    pub default_root_object: Option<String>,
    pub price_class: PriceClass,
    pub default_cache_behavior: CacheBehavior,
    pub restrictions: GeoRestriction,
    pub viewer_certificate: ViewerCertificate,
    pub custom_error_responses: Vec<CustomErrorResponse>,
}

impl Resource for DistributionArgs {
    const TYPE: &'static str = "aws:cloudfront/distribution:Distribution";
    const OUTPUTS: &'static [&'static str] = &["id", "arn", "domainName", "hostedZoneId", "status"];

    fn into_inputs(self) -> PropertyMap {
        PropertyMap::new()
            .with("enabled", self.enabled)
            .with("aliases", self.aliases)
            .with("origins", self.origins)
            .with_opt("defaultRootObject", self.default_root_object)
            .with("priceClass", self.price_class)
            .with("defaultCacheBehavior", self.default_cache_behavior)
            .with("restrictions", self.restrictions)
            .with("viewerCertificate", self.viewer_certificate)
            .with("customErrorResponses", self.custom_error_responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cache_behavior_wire_shape() {
        let behavior = CacheBehavior::static_content("origin".into()).into_property();
        assert_eq!(
            behavior.to_redacted_json(),
            json!({
                "targetOriginId": "origin",
                "allowedMethods": ["GET", "HEAD", "OPTIONS"],
                "cachedMethods": ["GET", "HEAD", "OPTIONS"],
                "viewerProtocolPolicy": "redirect-to-https",
                "forwardedValues": {
                    "cookies": { "forward": "none" },
                    "queryString": false,
                },
            })
        );
    }

    #[test]
    fn unrestricted_geo_has_no_locations() {
        assert_eq!(
            GeoRestriction::unrestricted().into_property().to_redacted_json(),
            json!({ "geoRestriction": { "restrictionType": "none" } })
        );
    }

    #[test]
    fn error_response_fallback() {
        let response = CustomErrorResponse::fallback_to(404, "/index.html", 86_400);
        assert_eq!(
            response.into_property().to_redacted_json(),
            json!({
                "errorCode": 404,
                "responseCode": 200,
                "responsePagePath": "/index.html",
                "errorCachingMinTtl": 86400,
            })
        );
    }

    #[test]
    fn price_class_wire_names() {
        assert_eq!(PriceClass::NorthAmericaEurope.to_string(), "PriceClass_100");
        assert_eq!(ViewerProtocolPolicy::RedirectToHttps.as_str(), "redirect-to-https");
    }
}

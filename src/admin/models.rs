use serde::{Deserialize, Deserializer, Serialize};

/// Tenant entry returned by the directory's tenant listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tenant {
    #[serde(alias = "tenantId")]
    pub tenant_id: i64,
    #[serde(alias = "document")]
    pub document: TenantDocument,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TenantDocument {
    #[serde(alias = "edfiApiDiscoveryUrl", deserialize_with = "null_as_empty")]
    pub edfi_api_discovery_url: String,
    #[serde(alias = "name", deserialize_with = "null_as_empty")]
    pub name: String,
}

impl Tenant {
    pub fn name(&self) -> &str {
        &self.document.name
    }
}

/// One monitored deployment as listed by the directory
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(alias = "Id")]
    pub id: i64,
    #[serde(alias = "OdsInstanceId", default)]
    pub ods_instance_id: i64,
    #[serde(alias = "TenantId")]
    pub tenant_id: i64,
    #[serde(alias = "TenantName", default, deserialize_with = "null_as_empty")]
    pub tenant_name: String,
    #[serde(alias = "InstanceName", default, deserialize_with = "null_as_empty")]
    pub instance_name: String,
    #[serde(alias = "ClientId", default, deserialize_with = "null_as_empty")]
    pub client_id: String,
    #[serde(alias = "ClientSecret", default, deserialize_with = "null_as_empty")]
    pub client_secret: String,
    #[serde(alias = "ResourceUrl", default, deserialize_with = "null_as_empty")]
    pub resource_url: String,
    #[serde(alias = "OauthUrl", default, deserialize_with = "null_as_empty")]
    pub oauth_url: String,
    #[serde(alias = "Status", default, deserialize_with = "null_as_empty")]
    pub status: String,
}

impl Instance {
    /// Settings an instance needs before it can be probed; empty when eligible
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("AuthenticationUrl", &self.oauth_url),
            ("ResourceUrl", &self.resource_url),
            ("ClientId", &self.client_id),
            ("ClientSecret", &self.client_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_eligible(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn display_name(&self) -> &str {
        if self.instance_name.is_empty() {
            "<No Name>"
        } else {
            &self.instance_name
        }
    }
}

/// Payload posted to the directory's health check endpoint.
/// `document` is itself serialized JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheckReport {
    pub tenant_id: i64,
    pub instance_id: i64,
    pub document: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_parsing() {
        let tenant: Tenant = serde_json::from_str(
            r#"{"TenantId": 1, "Document": {"EdfiApiDiscoveryUrl": "https://api.ed-fi.org/v7.1/api6/", "Name": "tenant1"}}"#,
        )
        .unwrap();

        assert_eq!(tenant.tenant_id, 1);
        assert_eq!(tenant.name(), "tenant1");
        assert_eq!(
            tenant.document.edfi_api_discovery_url,
            "https://api.ed-fi.org/v7.1/api6/"
        );
    }

    #[test]
    fn test_instance_parsing() {
        let instance: Instance = serde_json::from_str(
            r#"{
                "id": 1, "odsInstanceId": 1, "tenantId": 1, "tenantName": "tenant1",
                "instanceName": "instance 1", "clientId": "one client",
                "clientSecret": "one secret", "resourceUrl": "http://www.myserver.com/data/v3",
                "oauthUrl": "http://www.myserver.com/connect/token", "status": "Completed"
            }"#,
        )
        .unwrap();

        assert_eq!(instance.id, 1);
        assert_eq!(instance.instance_name, "instance 1");
        assert_eq!(instance.oauth_url, "http://www.myserver.com/connect/token");
        assert!(instance.is_eligible());
    }

    #[test]
    fn test_instance_null_strings() {
        let instance: Instance = serde_json::from_str(
            r#"{"Id": 3, "TenantId": 1, "ClientSecret": null, "InstanceName": null}"#,
        )
        .unwrap();

        assert_eq!(instance.client_secret, "");
        assert_eq!(instance.display_name(), "<No Name>");
        assert_eq!(
            instance.missing_fields(),
            vec!["AuthenticationUrl", "ResourceUrl", "ClientId", "ClientSecret"]
        );
    }

    #[test]
    fn test_missing_client_secret() {
        let instance = Instance {
            id: 1,
            tenant_id: 1,
            client_id: "client".to_string(),
            resource_url: "http://host/data/v3".to_string(),
            oauth_url: "http://host/connect/token".to_string(),
            ..Instance::default()
        };
        assert_eq!(instance.missing_fields(), vec!["ClientSecret"]);
    }

    #[test]
    fn test_report_serialization() {
        let report = HealthCheckReport {
            tenant_id: 1,
            instance_id: 2,
            document: "{}".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"TenantId":1,"InstanceId":2,"Document":"{}"}"#
        );
    }
}

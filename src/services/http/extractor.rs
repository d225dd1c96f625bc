use serde::Deserialize;

// 查询参数，缺省时按空字符串处理
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceQuery {
    #[serde(rename = "ServiceName", default)]
    pub service_name: String,
    #[serde(rename = "Address", default)]
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceQuery {
    #[serde(rename = "ServiceName", default)]
    pub service_name: String,
}

use strum::{Display, EnumString, IntoStaticStr};

#[derive(EnumString, IntoStaticStr, Display, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Method {
    #[strum(serialize = "GET")]
    GET,
    #[strum(serialize = "POST")]
    POST,
    #[strum(serialize = "PUT")]
    PUT,
    #[strum(serialize = "DELETE")]
    DELETE,
    #[strum(serialize = "OPTIONS")]
    OPTIONS,
    #[strum(serialize = "HEAD")]
    HEAD,
}

//! 服务发现模块
//!
//! 进程内的地址表与订阅集合：发现循环写入，出站调用读取。

pub mod directory;
pub mod endpoint;
pub mod subscription;
pub mod table;

pub use directory::ServiceDirectory;
pub use endpoint::Endpoint;
pub use subscription::SubscriptionSet;
pub use table::AddressTable;

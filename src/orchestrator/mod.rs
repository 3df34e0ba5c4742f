//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `upload_orchestrator` - 上传编排器
//! - 单一入口 `submit(file, user_id)`
//! - 把上传、轮询、结果关联合并为一条可观察的状态流
//! - 同一时刻最多一个活跃任务，新提交会取消旧轮询
//!
//! ### `app` - 顶层控制器
//! - 持有会话，决定上传与历史是否可用
//! - 装配后端客户端与各组件，供命令行入口使用
//!
//! ## 层次关系
//!
//! ```text
//! app (会话 + 装配)
//!     ↓
//! upload_orchestrator (单个任务的生命周期)
//!     ↓
//! workflow::JobPoller (轮询 + 取消)
//!     ↓
//! services / clients (关联、会话、历史 / 远端接口)
//!     ↓
//! infrastructure (HttpExecutor)
//! ```

pub mod app;
pub mod upload_orchestrator;

// 重新导出主要类型
pub use app::App;
pub use upload_orchestrator::{UploadOrchestrator, UploadSnapshot, UploadState};

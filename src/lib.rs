//! # Audio QA Client
//!
//! 音频问答服务的异步任务客户端：登录、上传音频、轮询处理进度、
//! 把问题与答案关联后交给调用方
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有 HTTP 连接池，只暴露请求能力
//! - `HttpExecutor` - 唯一的 `reqwest::Client` owner，负责错误归类
//!
//! ### ② 远端接口（Clients）
//! - `clients/` - `AuthService` / `JobService` / `HistoryService` 三个 trait
//! - `BackendClient` - 基于 HTTP 的实现
//!
//! ### ③ 业务能力层（Services）
//! - `correlate` - 问题与答案按标识关联
//! - `SessionHolder` - 会话持有与登录/注册/登出
//! - `HistorySync` - 历史任务同步
//!
//! ### ④ 流程层（Workflow）
//! - `PollMachine` - 纯数据的轮询状态机
//! - `JobPoller` - 按固定间隔查询，支持取消
//!
//! ### ⑤ 编排层（Orchestration）
//! - `UploadOrchestrator` - 单个任务的完整生命周期
//! - `App` - 顶层控制器

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{AuthService, BackendClient, HistoryService, JobService};
pub use config::{Config, PollSettings};
pub use error::{AppError, AppResult};
pub use models::{Answer, AudioFile, Job, JobId, JobResult, JobStatus, QaPair, Question, UserId};
pub use orchestrator::{App, UploadOrchestrator, UploadState};
pub use services::{correlate, HistorySync, SessionHolder};
pub use workflow::{JobPoller, PollOutcome};

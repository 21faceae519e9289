//! 控制台命令解析错误

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("未知命令: {0}（输入 h 查看帮助）")]
    Unknown(String),

    #[error("{0} 缺少参数")]
    MissingArg(&'static str),

    #[error("参数无效: {0}")]
    BadArg(String),
}

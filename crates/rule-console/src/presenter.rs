//! 结果展示
//!
//! 只有一个输出区域，始终显示最近一条消息。多行文本原样输出，不截断、不转义。

use std::io::Write;

use parking_lot::Mutex;

pub trait ResultPresenter: Send + Sync {
    fn show(&self, message: &str);
}

/// 输出到标准输出
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePresenter;

impl ResultPresenter for ConsolePresenter {
    fn show(&self, message: &str) {
        let mut out = std::io::stdout().lock();
        // 标准输出被关闭时没有其他可用的展示通道，忽略写入失败
        let _ = writeln!(out, "{message}");
        let _ = out.flush();
    }
}

/// 在内存中保存展示过的消息，供测试和嵌入方读取
#[derive(Debug, Default)]
pub struct MemoryPresenter {
    messages: Mutex<Vec<String>>,
}

impl MemoryPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前输出区域的内容
    pub fn latest(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }

    pub fn history(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl ResultPresenter for MemoryPresenter {
    fn show(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// 128 + SIGINT.
const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CtrlC {
    Stop,
    ForceExit,
}

/// One-shot cancellation flag, observed by the trainer between steps.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn on_ctrl_c(&self) -> CtrlC {
        if self.stopped.swap(true, Ordering::SeqCst) {
            CtrlC::ForceExit
        } else {
            CtrlC::Stop
        }
    }

    /// Trigger on the first Ctrl-C and exit the process on the second.
    /// The handler runs on a background thread with its own single-threaded
    /// runtime, and owns SIGINT from then on.
    pub fn install_ctrl_c(&self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()?;
        let signal = self.clone();

        thread::Builder::new()
            .name("ctrl-c".into())
            .spawn(move || {
                runtime.block_on(async {
                    loop {
                        if let Err(e) = tokio::signal::ctrl_c().await {
                            log::error!("Failed to listen for Ctrl-C: {}", e);
                            return;
                        }
                        match signal.on_ctrl_c() {
                            CtrlC::Stop => {
                                log::warn!(
                                    "Interrupt received, stopping after the current step (Ctrl-C again to exit now)"
                                );
                            }
                            CtrlC::ForceExit => {
                                log::error!("Second interrupt received, exiting");
                                std::process::exit(FORCED_EXIT_CODE);
                            }
                        }
                    }
                });
            })?;

        Ok(())
    }
}

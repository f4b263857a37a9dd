use crate::RuntimeCore;
use std::sync::{
    atomic::{
        AtomicI64,
        Ordering::{AcqRel, Acquire, Release},
    },
    Arc, Condvar, Mutex,
};

/// 等待策略:主动自旋或挂起线程。只影响时延与 CPU 占用,不影响正确性。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WaitState {
    Active,
    Blocked,
}

pub(crate) struct SignalCore {
    value: AtomicI64,
    lock: Mutex<()>,
    waiters: Condvar,
}

impl SignalCore {
    pub fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
            lock: Mutex::new(()),
            waiters: Condvar::new(),
        }
    }

    #[inline]
    pub fn load(&self) -> i64 {
        self.value.load(Acquire)
    }

    fn notify(&self) {
        let _guard = self.lock.lock().unwrap();
        self.waiters.notify_all();
    }

    pub fn store(&self, value: i64) {
        self.value.store(value, Release);
        self.notify();
    }

    pub fn subtract(&self, value: i64) {
        let _ = self.value.fetch_sub(value, AcqRel);
        self.notify();
    }

    /// 阻塞直至观察到满足条件的值,无超时。
    pub fn wait_until(&self, state: WaitState, cond: impl Fn(i64) -> bool) -> i64 {
        match state {
            WaitState::Active => loop {
                let value = self.load();
                if cond(value) {
                    break value;
                }
                std::hint::spin_loop();
                std::thread::yield_now();
            },
            WaitState::Blocked => {
                let mut guard = self.lock.lock().unwrap();
                loop {
                    let value = self.load();
                    if cond(value) {
                        break value;
                    }
                    guard = self.waiters.wait(guard).unwrap();
                }
            }
        }
    }
}

/// 设备可观察的计数信号,句柄经运行时注册表解析。
pub struct Signal {
    core: Arc<SignalCore>,
    runtime: Arc<RuntimeCore>,
    handle: u64,
}

impl Signal {
    pub(crate) fn new(runtime: Arc<RuntimeCore>, initial: i64) -> Self {
        let core = Arc::new(SignalCore::new(initial));
        let handle = runtime.register_signal(core.clone());
        Self {
            core,
            runtime,
            handle,
        }
    }

    #[inline]
    pub fn handle(&self) -> u64 {
        self.handle
    }

    #[inline]
    pub fn value(&self) -> i64 {
        self.core.load()
    }

    #[inline]
    pub fn store(&self, value: i64) {
        self.core.store(value)
    }

    #[inline]
    pub fn subtract(&self, value: i64) {
        self.core.subtract(value)
    }

    /// 等待信号值降到界以下。
    #[inline]
    pub fn wait_lt(&self, bound: i64, state: WaitState) -> i64 {
        self.core.wait_until(state, |value| value < bound)
    }

    /// 等待信号值升到界及以上。
    #[inline]
    pub fn wait_gte(&self, bound: i64, state: WaitState) -> i64 {
        self.core.wait_until(state, |value| value >= bound)
    }

    pub(crate) fn core(&self) -> &Arc<SignalCore> {
        &self.core
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        self.runtime.unregister_signal(self.handle);
    }
}

#[cfg(test)]
mod test {
    use super::WaitState;
    use crate::Runtime;
    use std::{thread, time::Duration};

    #[test]
    fn test_wait() {
        let rt = Runtime::new();
        for state in [WaitState::Active, WaitState::Blocked] {
            let signal = rt.create_signal(1);
            thread::scope(|s| {
                s.spawn(|| {
                    thread::sleep(Duration::from_millis(10));
                    signal.subtract(1);
                });
                assert_eq!(signal.wait_lt(1, state), 0);
            });
        }
    }

    #[test]
    fn test_doorbell_style() {
        let rt = Runtime::new();
        let signal = rt.create_signal(-1);
        thread::scope(|s| {
            s.spawn(|| {
                thread::sleep(Duration::from_millis(10));
                signal.store(3);
            });
            assert_eq!(signal.wait_gte(0, WaitState::Blocked), 3);
        });
    }

    #[test]
    fn test_registry() {
        let rt = Runtime::new();
        let signal = rt.create_signal(1);
        let handle = signal.handle();
        assert_ne!(handle, 0);
        drop(signal);
        let next = rt.create_signal(1);
        assert_ne!(next.handle(), handle);
    }
}

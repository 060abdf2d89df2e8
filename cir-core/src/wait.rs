//! Ожидание аппаратного события опросом с ограничением по времени.

use std::time::{Duration, Instant};

use cir_types::CirResult;

/// Результат ожидания.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// Условие выполнено
    Ready(T),
    /// Время вышло
    TimedOut { waited: Duration },
}

impl<T> PollOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready(_))
    }
}

/// Опрашивает `poll`, пока он не вернёт `Some`.
///
/// При `timeout = None` ждём бесконечно. Ошибка опроса прерывает ожидание.
pub fn poll_until<T, F>(
    timeout: Option<Duration>,
    mut poll: F,
) -> CirResult<PollOutcome<T>>
where
    F: FnMut() -> CirResult<Option<T>>,
{
    let start = Instant::now();

    loop {
        if let Some(value) = poll()? {
            return Ok(PollOutcome::Ready(value));
        }

        if let Some(limit) = timeout {
            let waited = start.elapsed();
            if waited >= limit {
                return Ok(PollOutcome::TimedOut { waited });
            }
        }

        std::hint::spin_loop();
    }
}

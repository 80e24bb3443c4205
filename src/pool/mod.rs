//! # Pool de Tareas
//! src/pool/mod.rs
//!
//! Pool de tamaño fijo de threads del sistema operativo que consumen una
//! cola de prioridad compartida. Cada conexión aceptada es una tarea que un
//! único worker ejecuta de principio a fin.
//!
//! ## Características
//!
//! - Fire-and-forget: la tarea maneja sus propios errores y recursos
//! - Cola sin límite: `submit` nunca bloquea (no hay backpressure)
//! - Un panic dentro de una tarea se captura y el worker sigue atendiendo
//! - `stop()` no interrumpe tareas en curso; descarta las pendientes

mod queue;

pub use queue::Task;

use queue::TaskQueue;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Prioridad usada por `submit`
pub const DEFAULT_PRIORITY: i32 = 1;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Task pool is stopped")]
    Stopped,

    #[error("Task pool needs at least one worker")]
    NoWorkers,

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Pool de workers con cola de prioridad
pub struct TaskPool {
    queue: Arc<TaskQueue>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl TaskPool {
    /// Crea el pool y arranca `size` workers
    pub fn new(size: usize) -> Result<Self, PoolError> {
        if size == 0 {
            return Err(PoolError::NoWorkers);
        }

        let queue = Arc::new(TaskQueue::new());
        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            let name = format!("worker-{}", id);
            let worker_queue = Arc::clone(&queue);

            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker_loop(name, worker_queue));

            match handle {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // No dejar workers huérfanos esperando en la cola
                    queue.shutdown();
                    for worker in workers {
                        let _ = worker.join();
                    }
                    return Err(e.into());
                }
            }
        }

        tracing::debug!(workers = size, "pool de tareas iniciado");

        Ok(Self {
            queue,
            workers: Mutex::new(workers),
            size,
        })
    }

    /// Encola una acción con prioridad `DEFAULT_PRIORITY`
    pub fn submit<F>(&self, action: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_with_priority(DEFAULT_PRIORITY, action)
    }

    /// Encola una acción; menor número se ejecuta antes
    pub fn submit_with_priority<F>(&self, priority: i32, action: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(priority, Box::new(action))
    }

    /// Detiene el pool
    ///
    /// Las tareas en curso terminan normalmente; las pendientes se descartan
    /// y no se aceptan nuevas.
    pub fn stop(&self) {
        let dropped = self.queue.shutdown();
        if dropped > 0 {
            tracing::warn!(dropped, "pool detenido con tareas pendientes descartadas");
        }
    }

    /// Espera a que todos los workers terminen (llamar después de `stop`)
    pub fn join(&self) {
        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );

        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("un worker terminó con panic");
            }
        }
    }

    /// Tamaño del pool
    pub fn size(&self) -> usize {
        self.size
    }

    /// Tareas encoladas que todavía no tomó ningún worker
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_stopped(&self) -> bool {
        self.queue.is_shutdown()
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}

/// Loop de cada worker: tomar tarea, ejecutarla, repetir
fn worker_loop(name: String, queue: Arc<TaskQueue>) {
    tracing::trace!(worker = %name, "worker iniciado");

    while let Some(task) = queue.pop() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            tracing::error!(
                worker = %name,
                panic = %panic_message(payload.as_ref()),
                "la tarea terminó en panic"
            );
        }
    }

    tracing::trace!(worker = %name, "worker detenido");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

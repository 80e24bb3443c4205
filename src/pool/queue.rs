//! # Cola de Prioridad de Tareas
//! src/pool/queue.rs
//!
//! Cola thread-safe compartida por los workers del pool: un `BinaryHeap`
//! protegido por un único par `Mutex` + `Condvar`.
//!
//! - Menor número de prioridad sale primero
//! - Entre prioridades iguales, FIFO (número de secuencia creciente)
//! - Sin capacidad máxima: encolar nunca bloquea

use super::PoolError;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Acción ejecutada por un worker
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Wrapper para ordenar tareas en el heap
struct PriorityTask {
    priority: i32,
    seq: u64,
    action: Task,
}

// BinaryHeap es max-heap: se invierte el orden para sacar el mínimo
impl PartialEq for PriorityTask {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for PriorityTask {}

impl PartialOrd for PriorityTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriorityTask {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct QueueState {
    heap: BinaryHeap<PriorityTask>,
    next_seq: u64,
    shutdown: bool,
}

/// Cola compartida entre el pool y sus workers
pub(crate) struct TaskQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                heap: BinaryHeap::new(),
                next_seq: 0,
                shutdown: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Las acciones corren fuera del lock, así que un lock envenenado no
    /// deja el estado a medio modificar
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola una acción y despierta a un worker
    pub(crate) fn push(&self, priority: i32, action: Task) -> Result<(), PoolError> {
        let mut state = self.lock();

        if state.shutdown {
            return Err(PoolError::Stopped);
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(PriorityTask {
            priority,
            seq,
            action,
        });

        self.available.notify_one();
        Ok(())
    }

    /// Saca la tarea de menor prioridad, bloqueando mientras la cola esté vacía
    ///
    /// Retorna `None` una vez que la cola fue cerrada.
    pub(crate) fn pop(&self) -> Option<Task> {
        let mut state = self.lock();

        loop {
            if state.shutdown {
                return None;
            }

            if let Some(task) = state.heap.pop() {
                return Some(task.action);
            }

            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Cierra la cola, descarta lo pendiente y despierta a todos los workers
    ///
    /// Retorna la cantidad de tareas descartadas.
    pub(crate) fn shutdown(&self) -> usize {
        let dropped = {
            let mut state = self.lock();
            state.shutdown = true;
            std::mem::take(&mut state.heap)
        };

        self.available.notify_all();
        dropped.len()
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    /// Tareas esperando un worker
    pub(crate) fn len(&self) -> usize {
        self.lock().heap.len()
    }
}

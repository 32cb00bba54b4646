//! Simulated browser tabs sharing one labeled event queue
//!
//! One producer thread per tab queues tasks labeled with that tab's group;
//! a chrome thread queues unlabeled tasks now and then. The main thread
//! dispatches ready events to a small worker pool and finishes their runs
//! as completions come back. Workers check that no tab ever runs two tasks
//! at once and that every tab's tasks run in order.
//!
//! # Environment Variables
//!
//! - `TABS=6` - Number of tabs
//! - `TASKS_PER_TAB=200` - Tasks queued by each tab
//! - `WORKERS=4` - Worker threads
//! - `ACTIVE_TAB=0` - Index of the foreground tab (-1 for none)
//! - `LQ_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)
//! - `LQ_FLUSH_EPRINT=1` - Flush log output immediately

use crossbeam_queue::ArrayQueue;
use labelq::{env_get, kdebug, kerror, kinfo, kwarn, set_context};
use labelq::{Entry, EventQueue, GroupId, GroupSet, Labelable, QueueConfig, RunTicket};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Unlabeled tasks queued by the chrome thread
const CHROME_TASKS: usize = 50;

struct TabTask {
    tab: Option<(usize, GroupId)>,
    seq: u64,
    work_us: u64,
}

impl Labelable for TabTask {
    fn affected_groups(&self) -> Option<GroupSet> {
        self.tab.map(|(_, group)| GroupSet::one(group))
    }
}

struct Job {
    entry: Entry<TabTask>,
    ticket: RunTicket,
}

/// Shared between the dispatcher and workers
struct Pool {
    work: ArrayQueue<Job>,
    done: ArrayQueue<RunTicket>,
    shutdown: AtomicBool,
    /// Per tab: set while one of its tasks runs
    in_flight: Vec<AtomicBool>,
    /// Per tab: sequence number of the last task run
    last_seq: Vec<AtomicU64>,
    /// Per tab: tasks completed
    completed: Vec<AtomicUsize>,
    chrome_completed: AtomicUsize,
    violations: AtomicUsize,
}

fn main() {
    println!("=== Labeled Queue: Tabs Example ===\n");

    let tabs: usize = env_get("TABS", 6);
    let tasks_per_tab: u64 = env_get("TASKS_PER_TAB", 200);
    let workers = env_get::<usize>("WORKERS", 4).max(1);
    let active_tab: i64 = env_get("ACTIVE_TAB", 0);

    let config = QueueConfig::from_env();
    let queue = match EventQueue::<TabTask>::new(config) {
        Ok(q) => Arc::new(q),
        Err(e) => {
            kerror!("{}", e);
            std::process::exit(2);
        }
    };

    let mut groups = Vec::with_capacity(tabs);
    for _ in 0..tabs {
        match queue.register_group() {
            Ok(g) => groups.push(g),
            Err(e) => {
                kerror!("cannot register tab: {}", e);
                std::process::exit(2);
            }
        }
    }
    if let Some(&fg) = usize::try_from(active_tab).ok().and_then(|i| groups.get(i)) {
        if let Err(e) = queue.set_active(fg, true) {
            kwarn!("cannot activate tab {}: {}", active_tab, e);
        }
        kinfo!("tab {} ({}) is in the foreground", active_tab, fg);
    }

    let pool = Arc::new(Pool {
        work: ArrayQueue::new(workers * 2),
        done: ArrayQueue::new(workers * 2),
        shutdown: AtomicBool::new(false),
        in_flight: (0..tabs).map(|_| AtomicBool::new(false)).collect(),
        last_seq: (0..tabs).map(|_| AtomicU64::new(0)).collect(),
        completed: (0..tabs).map(|_| AtomicUsize::new(0)).collect(),
        chrome_completed: AtomicUsize::new(0),
        violations: AtomicUsize::new(0),
    });

    let start = Instant::now();

    // Producers
    let mut producers = Vec::with_capacity(tabs + 1);
    for (index, &group) in groups.iter().enumerate() {
        let q = Arc::clone(&queue);
        producers.push(thread::spawn(move || {
            set_context(&format!("tab-{}", index));
            for seq in 1..=tasks_per_tab {
                q.put_event(TabTask { tab: Some((index, group)), seq, work_us: 20 + (seq % 5) * 10 });
                if seq % 32 == 0 {
                    thread::yield_now();
                }
            }
            kdebug!("queued {} tasks", tasks_per_tab);
        }));
    }
    {
        let q = Arc::clone(&queue);
        producers.push(thread::spawn(move || {
            set_context("chrome");
            for seq in 1..=CHROME_TASKS as u64 {
                q.put_event(TabTask { tab: None, seq, work_us: 50 });
                thread::sleep(Duration::from_micros(200));
            }
        }));
    }

    // Workers
    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let pool = Arc::clone(&pool);
        let handle = thread::Builder::new()
            .name(format!("tabs-worker-{}", worker_id))
            .spawn(move || worker_loop(pool, worker_id));
        match handle {
            Ok(h) => handles.push(h),
            Err(e) => {
                kerror!("failed to spawn worker: {}", e);
                std::process::exit(1);
            }
        }
    }

    // Dispatcher
    let total = tabs * tasks_per_tab as usize + CHROME_TASKS;
    let mut finished = 0usize;
    let mut running = 0usize;
    let timeout = Duration::from_secs(30);

    while finished < total {
        while let Some(ticket) = pool.done.pop() {
            if let Err(e) = queue.finish_run(ticket) {
                kerror!("finish_run: {}", e);
                pool.violations.fetch_add(1, Ordering::Relaxed);
            }
            running -= 1;
            finished += 1;
        }

        while !pool.work.is_full() {
            match queue.dispatch() {
                Ok(Some((entry, ticket))) => {
                    if pool.work.push(Job { entry, ticket }).is_err() {
                        kerror!("work queue overflow");
                        std::process::exit(1);
                    }
                    running += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    kerror!("dispatch: {}", e);
                    finished += 1;
                }
            }
        }

        if start.elapsed() > timeout {
            kwarn!("timeout with {} running, {} queued", running, queue.count());
            break;
        }
        thread::yield_now();
    }

    pool.shutdown.store(true, Ordering::SeqCst);
    for h in handles {
        let _ = h.join();
    }
    for p in producers {
        let _ = p.join();
    }

    let elapsed = start.elapsed();
    println!("Finished {}/{} tasks in {:?}", finished, total, elapsed);
    for (index, group) in groups.iter().enumerate() {
        println!(
            "  tab {} ({}): {} completed",
            index,
            group,
            pool.completed[index].load(Ordering::Relaxed)
        );
    }
    println!("  chrome: {} completed", pool.chrome_completed.load(Ordering::Relaxed));
    println!("  queue:  {}", queue.stats());

    let violations = pool.violations.load(Ordering::Relaxed);
    if violations > 0 {
        println!("\n{} ordering/exclusion violation(s)", violations);
        std::process::exit(1);
    }
    println!("\n=== Example Complete ===");
}

fn worker_loop(pool: Arc<Pool>, worker_id: usize) {
    set_context(&format!("worker-{}", worker_id));
    loop {
        match pool.work.pop() {
            Some(job) => {
                run_task(&pool, job.entry.runnable());
                // The dispatcher is the only consumer; retry until it drains
                let mut ticket = job.ticket;
                while let Err(back) = pool.done.push(ticket) {
                    if pool.shutdown.load(Ordering::Relaxed) {
                        return;
                    }
                    ticket = back;
                    std::hint::spin_loop();
                }
            }
            None => {
                if pool.shutdown.load(Ordering::Relaxed) {
                    break;
                }
                thread::park_timeout(Duration::from_millis(1));
            }
        }
    }
}

fn run_task(pool: &Pool, task: &TabTask) {
    let Some((index, group)) = task.tab else {
        kdebug!("chrome task {}", task.seq);
        spin_for(task.work_us);
        pool.chrome_completed.fetch_add(1, Ordering::Relaxed);
        return;
    };

    if pool.in_flight[index].swap(true, Ordering::AcqRel) {
        kerror!("tab {} ({}) already has a task running", index, group);
        pool.violations.fetch_add(1, Ordering::Relaxed);
    }
    let prev = pool.last_seq[index].swap(task.seq, Ordering::AcqRel);
    if prev + 1 != task.seq {
        kerror!("tab {} ran task {} after {}", index, task.seq, prev);
        pool.violations.fetch_add(1, Ordering::Relaxed);
    }

    spin_for(task.work_us);

    pool.in_flight[index].store(false, Ordering::Release);
    pool.completed[index].fetch_add(1, Ordering::Relaxed);
}

fn spin_for(us: u64) {
    let until = Instant::now() + Duration::from_micros(us);
    while Instant::now() < until {
        std::hint::spin_loop();
    }
}

//! Prompt assembly for task questions.
//!
//! The user prompt carries the question, a statistics block and a numbered
//! task listing. Deadlines are rendered relative to the caller's `today`.

use std::fmt::Write;

use chrono::{NaiveDate, NaiveDateTime};

use crate::entities::{Task, TaskStatus};

/// Fixed system instruction sent ahead of every question.
pub const SYSTEM_PROMPT: &str = "Kamu adalah asisten AI untuk aplikasi Task Management.

ATURAN PENTING:
1. HANYA jawab pertanyaan yang berkaitan dengan data task yang diberikan.
2. Jika pertanyaan TIDAK berkaitan dengan task/tugas/pekerjaan, jawab dengan sopan: \"Maaf, saya hanya bisa membantu menjawab pertanyaan seputar task management seperti status task, deadline, assignee, dan informasi task lainnya.\"
3. Jawab dalam Bahasa Indonesia yang ringkas dan jelas.
4. Jika data tidak tersedia untuk menjawab, katakan dengan jujur.
5. Gunakan format yang mudah dibaca (bullet points, numbering jika perlu).
6. Untuk pertanyaan tentang jumlah/statistik, berikan angka yang tepat dari data.

KEMAMPUAN:
- Menampilkan daftar task berdasarkan status (Todo, In Progress, Done)
- Menghitung jumlah task
- Mencari task berdasarkan deadline (hari ini, besok, minggu ini, terlambat)
- Memberitahu assignee dari task tertentu
- Memberikan ringkasan/summary task
- Mencari task berdasarkan judul atau deskripsi
";

const UNASSIGNED: &str = "Belum ditugaskan";

/// Render a deadline with a hint relative to `today`.
#[must_use]
pub fn format_deadline(deadline: Option<NaiveDateTime>, today: NaiveDate) -> String {
    let Some(deadline) = deadline else {
        return "Tidak ada deadline".to_string();
    };

    let date = deadline.format("%Y-%m-%d");
    let diff = deadline.date().signed_duration_since(today).num_days();

    match diff {
        d if d < 0 => format!("{date} (⚠️ TERLAMBAT {} hari)", d.unsigned_abs()),
        0 => format!("{date} (📌 HARI INI)"),
        1 => format!("{date} (⏰ BESOK)"),
        2..=7 => format!("{date} ({diff} hari lagi)"),
        _ => date.to_string(),
    }
}

/// Counts and deadline summary block.
#[must_use]
pub fn task_statistics(tasks: &[Task], today: NaiveDate) -> String {
    if tasks.is_empty() {
        return "Tidak ada task.".to_string();
    }

    let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
    let overdue = tasks.iter().filter(|t| t.is_overdue(today)).count();
    let due_today = tasks.iter().filter(|t| t.is_due_on(today)).count();
    let unassigned = tasks.iter().filter(|t| !t.is_assigned()).count();

    format!(
        "📊 STATISTIK TASK:\n\
         - Total: {} task\n\
         - Todo: {} | In Progress: {} | Done: {}\n\
         - Deadline hari ini: {due_today}\n\
         - Terlambat (overdue): {overdue}\n\
         - Belum ada assignee: {unassigned}",
        tasks.len(),
        count(TaskStatus::Todo),
        count(TaskStatus::InProgress),
        count(TaskStatus::Done),
    )
}

/// Numbered listing, one block per task.
#[must_use]
pub fn summarize_tasks(tasks: &[Task], today: NaiveDate) -> String {
    if tasks.is_empty() {
        return "Tidak ada task yang ditemukan.".to_string();
    }

    let mut out = String::new();
    for (i, task) in tasks.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        let assignee = task.assignee_name.as_deref().unwrap_or(UNASSIGNED);
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "{}. {}\n   Status: {} {}\n   Deadline: {}\n   Assignee: {assignee}",
            i + 1,
            task.title,
            task.status.emoji(),
            task.status,
            format_deadline(task.deadline, today),
        );
    }
    out
}

/// Full user prompt for a question over the selected tasks.
#[must_use]
pub fn build_prompt(question: &str, tasks: &[Task], today: NaiveDate) -> String {
    format!(
        "Pertanyaan user: {question}\n\n{}\n\n📋 DAFTAR TASK:\n{}\n\nBerikan jawaban yang relevan berdasarkan data di atas.",
        task_statistics(tasks, today),
        summarize_tasks(tasks, today),
    )
}

//! Testing utilities for the rxmig workspace
//!
//! Shared TypeScript fixtures, a project-tree builder over a temporary
//! directory, and configuration shortcuts.

#![allow(missing_docs)]

use rxmig_core::MigrationConfig;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Store with one simple-load method in an object literal
pub const SIMPLE_LOAD_STORE: &str = r"import { inject } from '@angular/core';
import { signalStore, withState, withMethods, patchState } from '@ngrx/signals';
import { ProjectService } from './project.service';
import { Project } from './project.model';

interface ProjectState {
  projects: Project[];
  loading: boolean;
  error: string | null;
}

const initialState: ProjectState = { projects: [], loading: false, error: null };

export const ProjectStore = signalStore(
  withState(initialState),
  withMethods((store, projectService = inject(ProjectService)) => ({
    async loadProjects(filter: string): Promise<void> {
      patchState(store, { loading: true, error: null });
      try {
        const projects = await projectService.getProjects(filter);
        patchState(store, { projects, loading: false });
      } catch (error) {
        patchState(store, { error: String(error), loading: false });
      }
    },
  })),
);
";

/// Store with one optimistic-update method
pub const OPTIMISTIC_STORE: &str = r"import { inject } from '@angular/core';
import { signalStore, withState, withMethods, patchState } from '@ngrx/signals';
import { TodoService } from './todo.service';
import { Todo } from './todo.model';

type TodoState = {
  todos: Todo[];
  error: string | null;
};

export const TodoStore = signalStore(
  withState<TodoState>({ todos: [], error: null }),
  withMethods((store, todoService = inject(TodoService)) => ({
    async toggleTodo(id: string): Promise<void> {
      const previous = store.todos();
      patchState(store, { todos: previous.map((t) => (t.id === id ? { ...t, done: !t.done } : t)) });
      try {
        await todoService.toggle(id);
      } catch (error) {
        // rollback to the snapshot
        patchState(store, { todos: previous, error: String(error) });
      }
    },
  })),
);
";

/// Store with one bulk method fanning a string array out
pub const BULK_STORE: &str = r"import { inject } from '@angular/core';
import { signalStore, withState, withMethods, patchState } from '@ngrx/signals';
import { FileService } from './file.service';

export const FileStore = signalStore(
  withState({ files: [] as string[], progress: 0, loading: false, error: null as string | null }),
  withMethods((store, fileService = inject(FileService)) => ({
    async deleteFiles(ids: string[]): Promise<void> {
      let completed = 0;
      await Promise.all(
        ids.map(async (id) => {
          await fileService.remove(id);
          completed++;
          patchState(store, { progress: completed / ids.length });
        }),
      );
      patchState(store, { files: store.files().filter((f) => !ids.includes(f)) });
    },
  })),
);
";

/// Store with one long branching method no template matches
pub const CUSTOM_STORE: &str = r"import { inject } from '@angular/core';
import { signalStore, withState, withMethods, patchState } from '@ngrx/signals';

export const SyncStore = signalStore(
  withState({ status: 'idle', retries: 0 }),
  withMethods((store, syncService = inject(SyncService), auditService = inject(AuditService)) => ({
    async synchronize(mode: string, force = false): Promise<boolean> {
      if (mode === 'full') {
        const exported = await syncService.exportAll();
        if (!exported && !force) {
          return false;
        }
        await auditService.record('full', exported);
      } else if (mode === 'delta') {
        const changes = await syncService.changesSince(store.retries());
        for (const change of changes) {
          if (change.conflict) {
            await auditService.record('conflict', change);
          }
        }
      } else {
        patchState(store, { status: 'unknown' });
      }
      while (store.retries() < 3) {
        try {
          await syncService.ping();
          break;
        } catch {
          patchState(store, { retries: store.retries() + 1 });
        }
      }
      try {
        await syncService.commit();
      } catch {
        return false;
      }
      patchState(store, { status: 'done' });
      return true;
    },
  })),
);
";

/// Class-based store with a parameter-property collaborator
pub const CLASS_STORE: &str = r"import { Injectable, signal } from '@angular/core';
import { UserApi } from './user.api';

interface UserState {
  users: string[];
  isLoading: boolean;
  errorMessage: string | null;
}

@Injectable({ providedIn: 'root' })
export class UserStore {
  readonly users = signal<string[]>([]);

  constructor(private readonly userApi: UserApi) {}

  async loadUsers(): Promise<string[]> {
    this.isLoading.set(true);
    try {
      const users = await this.userApi.fetchUsers();
      return users;
    } catch (error) {
      this.errorMessage.set(String(error));
      return [];
    } finally {
      this.isLoading.set(false);
    }
  }
}
";

/// Store with an unclosed method body
pub const UNBALANCED_STORE: &str = r"import { signalStore, withMethods } from '@ngrx/signals';

export const BrokenStore = signalStore(
  withMethods((store) => ({
    async load(): Promise<void> {
      await Promise.resolve();
  })),
);
";

/// Store with no suspending procedures
pub const NO_CANDIDATES_STORE: &str = r"import { signalStore, withState, withMethods, patchState } from '@ngrx/signals';

export const CounterStore = signalStore(
  withState({ count: 0 }),
  withMethods((store) => ({
    increment(): void {
      patchState(store, { count: store.count() + 1 });
    },
  })),
);
";

/// Store whose method is already a reactive pipeline
pub const ALREADY_CONVERTED_STORE: &str = r"import { signalStore, withState, withMethods, patchState } from '@ngrx/signals';
import { rxMethod } from '@ngrx/signals/rxjs-interop';
import { pipe, tap } from 'rxjs';

export const TickStore = signalStore(
  withState({ ticks: 0 }),
  withMethods((store) => ({
    tick: rxMethod<void>(pipe(tap(() => patchState(store, { ticks: store.ticks() + 1 })))),
  })),
);
";

/// Manifest declaring every required runtime dependency
pub const PACKAGE_JSON: &str = r#"{
  "name": "demo-app",
  "version": "1.0.0",
  "dependencies": {
    "@angular/core": "^19.0.0",
    "@ngrx/operators": "^19.0.0",
    "@ngrx/signals": "^19.0.0",
    "rxjs": "~7.8.0"
  }
}
"#;

/// Manifest missing `@ngrx/operators`
pub const PACKAGE_JSON_MISSING_OPERATORS: &str = r#"{
  "name": "demo-app",
  "dependencies": {
    "@ngrx/signals": "^19.0.0"
  },
  "devDependencies": {
    "rxjs": "~7.8.0"
  }
}
"#;

/// A throwaway project directory
///
/// Files are written relative to the root; the directory is removed on drop.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Create an empty project
    ///
    /// # Panics
    /// If the temporary directory cannot be created
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp project"),
        }
    }

    /// Create a project with a complete `package.json`
    #[must_use]
    pub fn with_manifest() -> Self {
        let project = Self::new();
        project.write("package.json", PACKAGE_JSON);
        project
    }

    /// Project root
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file, creating parent directories
    ///
    /// # Panics
    /// If the file cannot be written
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write fixture");
        path
    }

    /// Read a file back
    ///
    /// # Panics
    /// If the file cannot be read
    #[must_use]
    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(relative)).expect("read fixture")
    }

    /// Whether a file exists
    #[must_use]
    pub fn exists(&self, relative: &str) -> bool {
        self.dir.path().join(relative).exists()
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration with backups on, preview off, and small batches
#[must_use]
pub fn test_config() -> MigrationConfig {
    MigrationConfig::new().with_max_parallel_files(2)
}

/// Configuration for preview runs
#[must_use]
pub fn preview_config() -> MigrationConfig {
    test_config().with_preview(true)
}

/// Lines of `text`, as the scanner and assembler count them
#[must_use]
pub fn lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_writes_and_reads() {
        let project = TestProject::with_manifest();
        let path = project.write("src/app/a.store.ts", NO_CANDIDATES_STORE);
        assert!(path.exists());
        assert!(project.exists("package.json"));
        assert_eq!(project.read("src/app/a.store.ts"), NO_CANDIDATES_STORE);
    }

    #[test]
    fn configs() {
        assert!(preview_config().preview_only);
        assert!(test_config().create_backups);
    }
}

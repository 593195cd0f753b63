//! Snapshot providers and file eligibility.
//!
//! A snapshot is the ordered set of `(path, content)` pairs inspected for one run.
//! [`FixtureSnapshot`] stands in for real repository access: it always returns the
//! same bundled Express.js user API. [`StaticSnapshot`] serves any caller-supplied list.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use crate::contract::{SnapshotProvider, SourceFile};
use crate::error::SnapshotError;

const FIXTURE_MANIFEST: &str = r#"{
  "name": "simple-user-api",
  "version": "1.0.0",
  "description": "A simple API to manage users",
  "main": "server.js",
  "scripts": {
    "start": "node server.js"
  },
  "dependencies": {
    "express": "^4.17.1"
  }
}"#;

const FIXTURE_SERVER: &str = r#"
const express = require('express');
const userRoutes = require('./routes/users');

const app = express();
const PORT = process.env.PORT || 3000;

app.use(express.json());

app.use('/api/users', userRoutes);

app.get('/', (req, res) => {
  res.send('API is running...');
});

app.listen(PORT, () => {
  console.log(`Server is running on port ${PORT}`);
});
"#;

const FIXTURE_ROUTES: &str = r#"
const express = require('express');
const router = express.Router();

let users = [
  { id: 1, name: 'Alice' },
  { id: 2, name: 'Bob' }
];

router.get('/', (req, res) => {
  res.json(users);
});

router.get('/:id', (req, res) => {
  const user = users.find(u => u.id === parseInt(req.params.id));
  if (!user) return res.status(404).send('User not found.');
  res.json(user);
});

router.post('/', (req, res) => {
  const newUser = {
    id: users.length + 1,
    name: req.body.name
  };
  users.push(newUser);
  res.status(201).json(newUser);
});

module.exports = router;
"#;

const FIXTURE_GITIGNORE: &str = "\nnode_modules\n.env\n";

/// The bundled sample project: a manifest, an entry point, a routing file and an ignore file.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSnapshot;

impl FixtureSnapshot {
    pub fn files() -> Vec<SourceFile> {
        vec![
            SourceFile::new("package.json", FIXTURE_MANIFEST),
            SourceFile::new("server.js", FIXTURE_SERVER),
            SourceFile::new("routes/users.js", FIXTURE_ROUTES),
            SourceFile::new(".gitignore", FIXTURE_GITIGNORE),
        ]
    }
}

#[async_trait]
impl SnapshotProvider for FixtureSnapshot {
    async fn enumerate(&self) -> Result<Vec<SourceFile>, SnapshotError> {
        debug!("[SNAPSHOT] Serving bundled fixture project");
        Ok(Self::files())
    }
}

/// Serves a fixed, caller-supplied list of files in the given order.
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshot {
    files: Vec<SourceFile>,
}

impl StaticSnapshot {
    pub fn new(files: Vec<SourceFile>) -> Self {
        Self { files }
    }
}

#[async_trait]
impl SnapshotProvider for StaticSnapshot {
    async fn enumerate(&self) -> Result<Vec<SourceFile>, SnapshotError> {
        let mut seen = HashSet::new();
        for file in &self.files {
            if !seen.insert(file.path.as_str()) {
                return Err(SnapshotError::DuplicatePath(file.path.clone()));
            }
        }
        Ok(self.files.clone())
    }
}

/// Decides which files get a per-file summary.
pub trait FileFilter: Send + Sync {
    fn is_eligible(&self, file: &SourceFile) -> bool;
}

impl<F> FileFilter for F
where
    F: Fn(&SourceFile) -> bool + Send + Sync,
{
    fn is_eligible(&self, file: &SourceFile) -> bool {
        self(file)
    }
}

/// Keeps files whose path ends with one of the configured extensions.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    /// Extensions may be given with or without the leading dot.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.as_ref().trim();
                if ext.starts_with('.') {
                    ext.to_string()
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Self { extensions }
    }

    /// The reference ecosystem: JavaScript sources.
    pub fn javascript() -> Self {
        Self::new(["js"])
    }
}

impl FileFilter for ExtensionFilter {
    fn is_eligible(&self, file: &SourceFile) -> bool {
        self.extensions.iter().any(|ext| file.path.ends_with(ext))
    }
}

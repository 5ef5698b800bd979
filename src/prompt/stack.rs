//! Primary technology stack of a change set

use std::fmt;

use serde::Serialize;

use crate::github::ChangedFile;

/// Dominant technology among the changed files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TechStack {
    Django,
    React,
    Docker,
    Mixed,
}

impl TechStack {
    /// A kind wins with more than half of the recognised files
    pub fn detect(files: &[ChangedFile]) -> Self {
        let (mut py, mut ts, mut docker) = (0usize, 0usize, 0usize);

        for file in files {
            let name = file.filename.to_lowercase();
            if name.ends_with(".py") {
                py += 1;
            } else if [".ts", ".tsx", ".jsx", ".js"].iter().any(|ext| name.ends_with(ext)) {
                ts += 1;
            } else if name.contains("dockerfile") || name == "docker-compose.yml" {
                docker += 1;
            }
        }

        let total = py + ts + docker;
        if total == 0 {
            return TechStack::Mixed;
        }
        if py * 2 > total {
            TechStack::Django
        } else if ts * 2 > total {
            TechStack::React
        } else if docker * 2 > total {
            TechStack::Docker
        } else {
            TechStack::Mixed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TechStack::Django => "django",
            TechStack::React => "react",
            TechStack::Docker => "docker",
            TechStack::Mixed => "mixed",
        }
    }

    /// Stack-specific review checklist
    pub fn guidelines(&self) -> &'static str {
        match self {
            TechStack::Django => DJANGO_GUIDELINES,
            TechStack::React => REACT_GUIDELINES,
            TechStack::Docker => DOCKER_GUIDELINES,
            TechStack::Mixed => MIXED_GUIDELINES,
        }
    }
}

impl fmt::Display for TechStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const DJANGO_GUIDELINES: &str = r#"## Django-Specific Security & Best Practices

**Priority Checks**:
1. **ORM Injection**: Check for `.raw()`, `.extra()`, or string interpolation in queries
   - Bad: `User.objects.raw(f"SELECT * FROM users WHERE id = {user_id}")`
   - Good: `User.objects.raw("SELECT * FROM users WHERE id = %s", [user_id])`

2. **GraphQL Security**: Validate query complexity limits and authentication on resolvers
   - Ensure all resolvers have proper authentication decorators
   - Check for N+1 query issues (use `.select_related()` / `.prefetch_related()`)

3. **Celery Tasks**: Check for task injection and proper error handling
   - Validate task arguments are sanitized
   - Ensure retry logic and failure handling

4. **Django Admin**: Verify CSRF protection and permission checks
   - Custom admin actions should check permissions
   - Sensitive operations require confirmation

5. **File Uploads**: Check for file type validation and size limits
   - Validate file extensions and MIME types

6. **Migrations**: Check for safe migrations (no blocking operations)
   - Avoid adding columns without defaults on large tables
   - Check for index creation (use CONCURRENTLY in production)
"#;

const REACT_GUIDELINES: &str = r#"## React/Next.js-Specific Security & Best Practices

**Priority Checks**:
1. **XSS Prevention**: Check for dangerous patterns
   - Bad: Direct DOM manipulation with user input
   - Good: Use React's automatic escaping

2. **API Routes**: Validate authentication and CORS configuration
   - Check for auth middleware on protected routes
   - Verify CORS settings don't allow arbitrary origins

3. **State Management**: Check for sensitive data exposure
   - Bad: Credentials or personal data in localStorage/sessionStorage
   - Good: Sensitive data in memory only or secure httpOnly cookies

4. **Component Security**: Verify prop validation and TypeScript types
   - Check for proper TypeScript types (avoid `any`)

5. **SSR Security**: Check for server-side data leakage
   - Verify sensitive data isn't serialized to client

6. **Third-Party Libraries**: Flag dependencies with known vulnerabilities
   - Large bundle sizes (>100KB for single dependency)

7. **Performance**: Check for common React anti-patterns
   - Missing dependency arrays in useEffect
   - Unnecessary re-renders (missing memo/useMemo)
"#;

const DOCKER_GUIDELINES: &str = r#"## Docker/Infrastructure-Specific Security & Best Practices

**Priority Checks**:
1. **Base Images**: Verify official, minimal base images
   - Bad: `latest` tag, unofficial images, large base images

2. **Secrets Management**: Check for hardcoded credentials
   - Bad: `ENV DATABASE_PASSWORD=secret123`
   - Good: Use Docker secrets or environment variables at runtime

3. **User Permissions**: Verify containers run as non-root
   - Check for `USER` directive (not root)

4. **Network Isolation**: Check for proper network segmentation
   - Check for unnecessary exposed ports

5. **Volume Mounts**: Check for minimal, read-only mounts where possible

6. **Image Optimization**: Combine RUN commands, use .dockerignore, multi-stage builds

7. **Health Checks**: Verify HEALTHCHECK directives
"#;

const MIXED_GUIDELINES: &str = r#"## Multi-Technology Stack

This PR touches multiple technologies. Focus on:
1. **Cross-cutting concerns**: Authentication, authorization, data flow
2. **API boundaries**: Validate contracts between frontend/backend
3. **Integration security**: Check for consistent security across layers
4. **Data consistency**: Ensure data models align across stack
"#;

// Self-identification: which container does this process run in, and which
// compose project does that container belong to.

use tracing::{debug, info};

use crate::labels::COMPOSE_PROJECT_LABEL;
use crate::runtime::ContainerRuntime;

const MOUNTINFO_PATH: &str = "/proc/self/mountinfo";
const CONTAINERS_SEGMENT: &str = "/docker/containers/";

/// Extract a container id from the contents of `/proc/self/mountinfo`.
///
/// A containerized process sees its own id in mount source paths of the
/// form `.../docker/containers/<id>/...`.
pub fn container_id_from_mountinfo(contents: &str) -> Option<String> {
    for line in contents.lines() {
        if let Some((_, rest)) = line.split_once(CONTAINERS_SEGMENT) {
            let id = rest.split('/').next().unwrap_or("");
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
    }
    None
}

/// Container id of the current process, or `None` when not containerized.
pub async fn current_container_id() -> Option<String> {
    let contents = tokio::fs::read_to_string(MOUNTINFO_PATH).await.ok()?;
    container_id_from_mountinfo(&contents)
}

/// Compose project of the container this process runs in, if detectable.
///
/// A failed lookup of the process's own container counts as "not
/// detectable"; the caller falls back to unscoped discovery.
pub async fn compose_project(runtime: &dyn ContainerRuntime) -> Option<String> {
    let id = current_container_id().await?;
    info!(container = %id, "running as container");
    match runtime.container_labels(&id).await {
        Ok(labels) => labels.get(COMPOSE_PROJECT_LABEL).cloned(),
        Err(e) => {
            debug!(container = %id, error = %e, "unable to inspect own container");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_id_from_mountinfo() {
        let contents = "\
2837 2808 0:214 / / rw,relatime master:634 - overlay overlay rw,lowerdir=/var/lib/docker/overlay2/l/ABC\n\
2841 2837 254:1 /var/lib/docker/containers/0123abcd4567/resolv.conf /etc/resolv.conf rw,relatime - ext4 /dev/vda1 rw\n\
2842 2837 254:1 /var/lib/docker/containers/0123abcd4567/hostname /etc/hostname rw,relatime - ext4 /dev/vda1 rw\n";
        assert_eq!(
            container_id_from_mountinfo(contents),
            Some("0123abcd4567".to_string())
        );
    }

    #[test]
    fn test_mountinfo_without_container_paths() {
        let contents = "\
25 30 0:23 / /sys rw,nosuid,nodev,noexec,relatime shared:7 - sysfs sysfs rw\n\
26 30 0:5 / /proc rw,nosuid,nodev,noexec,relatime shared:13 - proc proc rw\n";
        assert_eq!(container_id_from_mountinfo(contents), None);
    }

    #[test]
    fn test_trailing_segment_without_id() {
        assert_eq!(
            container_id_from_mountinfo("1 2 0:1 /var/lib/docker/containers/ /x rw - ext4 d rw\n"),
            None
        );
    }
}

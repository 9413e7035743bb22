// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Symlink relocation.

Unpacked packages carry symlinks with absolute targets (`/usr/bin/foo ->
/bin/foo`). Interpreted relative to the host those would escape the sysroot,
so after all unpacks every absolute link target is rewritten to the
equivalent path expressed relatively from the link's own directory. The
produced tree is then usable when mounted or referenced at an arbitrary
prefix.

A link at depth `n` below the sysroot root pointing at `/A/B` is rewritten
to `../` × `n` + `A/B`. Relative links and non-links are untouched.
*/

use {
    crate::error::Result,
    std::path::{Component, Path, PathBuf},
    walkdir::WalkDir,
};

/// Rewrite absolute symlinks under a sysroot into relative form.
///
/// Returns the number of links rewritten.
pub fn relink_absolute_symlinks(root: &Path) -> Result<usize> {
    let mut rewritten = 0;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;

        if !entry.path_is_symlink() {
            continue;
        }

        let link_path = entry.path();
        let target = std::fs::read_link(link_path)?;

        if !target.is_absolute() {
            continue;
        }

        let replacement = relative_target(root, link_path, &target);

        std::fs::remove_file(link_path)?;
        std::os::unix::fs::symlink(&replacement, link_path)?;

        rewritten += 1;
    }

    Ok(rewritten)
}

/// Compute the relative replacement for an absolute link target.
fn relative_target(root: &Path, link_path: &Path, target: &Path) -> PathBuf {
    // The link's directory, relative to the sysroot root. Links yielded by
    // the walk are always beneath the root, so the prefix strip holds.
    let depth = link_path
        .parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map(|relative| relative.components().count())
        .unwrap_or(0);

    let mut replacement = PathBuf::new();

    for _ in 0..depth {
        replacement.push("..");
    }

    for component in target.components() {
        if let Component::Normal(part) = component {
            replacement.push(part);
        }
    }

    replacement
}

#[cfg(test)]
mod test {
    use {super::*, std::os::unix::fs::symlink};

    #[test]
    fn absolute_link_rewritten_relative() -> Result<()> {
        let td = tempfile::tempdir()?;
        let root = td.path();

        std::fs::create_dir_all(root.join("bin"))?;
        std::fs::write(root.join("bin/foo"), b"binary")?;
        std::fs::create_dir_all(root.join("usr/bin"))?;
        symlink("/bin/foo", root.join("usr/bin/foo"))?;

        let rewritten = relink_absolute_symlinks(root)?;
        assert_eq!(rewritten, 1);

        let target = std::fs::read_link(root.join("usr/bin/foo"))?;
        assert_eq!(target, PathBuf::from("../../bin/foo"));

        // The rewritten link resolves inside the sysroot.
        assert_eq!(std::fs::read(root.join("usr/bin/foo"))?, b"binary");

        Ok(())
    }

    #[test]
    fn root_level_link_has_no_ascent() -> Result<()> {
        let td = tempfile::tempdir()?;
        let root = td.path();

        std::fs::create_dir_all(root.join("usr/lib"))?;
        symlink("/usr/lib", root.join("lib"))?;

        relink_absolute_symlinks(root)?;

        assert_eq!(std::fs::read_link(root.join("lib"))?, PathBuf::from("usr/lib"));

        Ok(())
    }

    #[test]
    fn relative_links_untouched() -> Result<()> {
        let td = tempfile::tempdir()?;
        let root = td.path();

        std::fs::create_dir_all(root.join("usr/bin"))?;
        symlink("../../bin/sh", root.join("usr/bin/sh"))?;

        let rewritten = relink_absolute_symlinks(root)?;
        assert_eq!(rewritten, 0);

        assert_eq!(
            std::fs::read_link(root.join("usr/bin/sh"))?,
            PathBuf::from("../../bin/sh")
        );

        Ok(())
    }

    #[test]
    fn dangling_absolute_links_still_rewritten() -> Result<()> {
        let td = tempfile::tempdir()?;
        let root = td.path();

        std::fs::create_dir_all(root.join("etc"))?;
        symlink("/run/resolvconf/resolv.conf", root.join("etc/resolv.conf"))?;

        let rewritten = relink_absolute_symlinks(root)?;
        assert_eq!(rewritten, 1);

        assert_eq!(
            std::fs::read_link(root.join("etc/resolv.conf"))?,
            PathBuf::from("../run/resolvconf/resolv.conf")
        );

        Ok(())
    }

    #[test]
    fn plain_files_and_directories_untouched() -> Result<()> {
        let td = tempfile::tempdir()?;
        let root = td.path();

        std::fs::create_dir_all(root.join("etc"))?;
        std::fs::write(root.join("etc/hostname"), b"sysroot\n")?;

        let rewritten = relink_absolute_symlinks(root)?;
        assert_eq!(rewritten, 0);

        Ok(())
    }
}
